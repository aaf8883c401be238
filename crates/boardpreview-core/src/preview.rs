#![forbid(unsafe_code)]

//! Writing rendered HTML into an isolated frame document.
//!
//! Every render is a single open → write → close transaction on the frame's
//! document, so the previous document (DOM, scripts, listeners) is discarded
//! and the new markup is parsed from scratch. After the caller's HTML the
//! transaction appends the link-interception script produced by
//! [`interception_script`].
//!
//! # Interception script
//!
//! When it runs, the script attaches a click listener to every `<a>` already
//! in the document. A click on a same-host link with a single-slash
//! root-relative path (see [`crate::link::intercepted_path`]) is cancelled
//! and turned into a `postMessage` to the parent window:
//!
//! ```text
//! { "type": <message type>, "path": <link pathname> }
//! ```
//!
//! Anchors inserted after the script ran are not intercepted.

/// Attribute identifying the injected interception `<script>` element.
pub const INTERCEPT_MARKER: &str = "data-boardpreview-intercept";

/// The isolated rendering surface the coordinator writes into.
///
/// Implementations must treat `open` as discarding the current document
/// entirely. Once the surface is torn down, calls may fail; the coordinator
/// logs such failures and carries on.
pub trait PreviewFrame {
    type Error: std::fmt::Display;

    fn open(&mut self) -> Result<(), Self::Error>;

    fn write(&mut self, markup: &str) -> Result<(), Self::Error>;

    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Build the interception `<script>` for `message_type`.
#[must_use]
pub fn interception_script(message_type: &str) -> String {
    // serde_json yields a valid JS string literal; `</` is split so a
    // message type can never close the script element early.
    let tag = serde_json::Value::from(message_type)
        .to_string()
        .replace("</", "<\\/");
    format!(
        r#"
<script {INTERCEPT_MARKER}>
(function () {{
	function intercept(event) {{
		var link = event.currentTarget;
		if (link && link.pathname && link.host === location.host && link.pathname[0] === '/' && link.pathname[1] !== '/') {{
			event.preventDefault();
			event.stopPropagation();
			var origin = location.origin === 'null' ? '*' : location.origin;
			parent.postMessage({{ type: {tag}, path: link.pathname }}, origin);
		}}
	}}
	var links = document.getElementsByTagName('a');
	for (var i = 0; i < links.length; i++) {{
		links[i].addEventListener('click', intercept);
	}}
}})();
</script>
"#
    )
}

/// Replace the frame's document with `html` plus the interception script.
pub fn render_preview<F: PreviewFrame + ?Sized>(
    frame: &mut F,
    html: &str,
    script: &str,
) -> Result<(), F::Error> {
    frame.open()?;
    frame.write(html)?;
    frame.write(script)?;
    frame.close()
}
