#![forbid(unsafe_code)]

//! Minimal HTML tokenizer.
//!
//! Covers what rendered board pages contain: start/end tags with attributes
//! in any quoting style, text with common character references, comments,
//! doctype-like declarations, and raw-text elements (`<script>`, `<style>`,
//! `<textarea>`, `<title>`) whose contents are not parsed as markup.
//!
//! Like a browser it never fails: anything that is not recognizable markup
//! is kept as text, and a duplicate attribute keeps its first value.

/// A `name="value"` pair on a start tag. Names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<!DOCTYPE ...>` or any other `<!...>` / `<?...>` declaration.
    Declaration(String),
    Comment(String),
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
}

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Split `input` into tokens.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer {
        src: input,
        pos: 0,
        text_start: 0,
        tokens: Vec::new(),
    }
    .run()
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    text_start: usize,
    tokens: Vec<Token>,
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

impl<'a> Tokenizer<'a> {
    fn run(mut self) -> Vec<Token> {
        while self.pos < self.src.len() {
            if self.byte(self.pos) != Some(b'<') {
                self.pos += 1;
                continue;
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with("<!--") {
                self.flush_text();
                let (body, next) = self.until(self.pos + 4, "-->");
                self.tokens.push(Token::Comment(body.to_owned()));
                self.jump(next);
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.flush_text();
                let (body, next) = self.until(self.pos + 2, ">");
                self.tokens.push(Token::Declaration(body.trim().to_owned()));
                self.jump(next);
            } else if rest.starts_with("</") && self.is_alpha_at(self.pos + 2) {
                self.flush_text();
                self.end_tag();
            } else if self.is_alpha_at(self.pos + 1) {
                self.flush_text();
                self.start_tag();
            } else {
                self.pos += 1;
            }
        }
        self.pos = self.src.len();
        self.flush_text();
        self.tokens
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.src.as_bytes().get(at).copied()
    }

    fn is_alpha_at(&self, at: usize) -> bool {
        self.byte(at).is_some_and(|b| b.is_ascii_alphabetic())
    }

    /// Text from `start` up to `terminator`, and the position after it.
    fn until(&self, start: usize, terminator: &str) -> (&'a str, usize) {
        let src = self.src;
        let start = start.min(src.len());
        match src[start..].find(terminator) {
            Some(offset) => (&src[start..start + offset], start + offset + terminator.len()),
            None => (&src[start..], src.len()),
        }
    }

    fn jump(&mut self, to: usize) {
        self.pos = to;
        self.text_start = to;
    }

    fn flush_text(&mut self) {
        if self.text_start < self.pos {
            let text = decode_entities(&self.src[self.text_start..self.pos]);
            self.tokens.push(Token::Text(text));
        }
        self.text_start = self.pos;
    }

    fn skip_while(&self, mut at: usize, pred: impl Fn(u8) -> bool) -> usize {
        while self.byte(at).is_some_and(&pred) {
            at += 1;
        }
        at
    }

    fn end_tag(&mut self) {
        let name_start = self.pos + 2;
        let name_end = self.skip_while(name_start, |b| !is_space(b) && b != b'/' && b != b'>');
        let name = self.src[name_start..name_end].to_ascii_lowercase();
        let (_, next) = self.until(name_end, ">");
        self.tokens.push(Token::EndTag { name });
        self.jump(next);
    }

    fn start_tag(&mut self) {
        let src = self.src;
        let name_start = self.pos + 1;
        let name_end = self.skip_while(name_start, |b| !is_space(b) && b != b'/' && b != b'>');
        let name = src[name_start..name_end].to_ascii_lowercase();

        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;
        let mut at = name_end;
        loop {
            at = self.skip_while(at, is_space);
            match self.byte(at) {
                None => {
                    // Unterminated tag at end of input is dropped.
                    self.jump(self.src.len());
                    return;
                }
                Some(b'>') => {
                    at += 1;
                    break;
                }
                Some(b'/') => {
                    if self.byte(at + 1) == Some(b'>') {
                        self_closing = true;
                        at += 2;
                        break;
                    }
                    at += 1;
                    continue;
                }
                Some(_) => {}
            }

            let attr_start = at;
            at = self.skip_while(at, |b| !is_space(b) && !matches!(b, b'=' | b'>' | b'/'));
            if at == attr_start {
                // Stray `=` with no name.
                at += 1;
                continue;
            }
            let attr_name = src[attr_start..at].to_ascii_lowercase();

            at = self.skip_while(at, is_space);
            let mut value = "";
            if self.byte(at) == Some(b'=') {
                at = self.skip_while(at + 1, is_space);
                match self.byte(at) {
                    Some(quote @ (b'"' | b'\'')) => {
                        let quote = if quote == b'"' { "\"" } else { "'" };
                        let (quoted, next) = self.until(at + 1, quote);
                        value = quoted;
                        at = next;
                    }
                    _ => {
                        let value_start = at;
                        at = self.skip_while(at, |b| !is_space(b) && b != b'>');
                        value = &src[value_start..at];
                    }
                }
            }

            if !attrs.iter().any(|attr| attr.name == attr_name) {
                attrs.push(Attribute {
                    name: attr_name,
                    value: decode_entities(value),
                });
            }
        }

        let raw_text = !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str());
        let closing = format!("</{name}");
        self.tokens.push(Token::StartTag {
            name,
            attrs,
            self_closing,
        });
        self.jump(at);

        if raw_text {
            let end = src[self.pos..]
                .to_ascii_lowercase()
                .find(&closing)
                .map_or(src.len(), |offset| self.pos + offset);
            let raw = &src[self.pos..end];
            if !raw.is_empty() {
                let text = if closing == "</script" || closing == "</style" {
                    raw.to_owned()
                } else {
                    decode_entities(raw)
                };
                self.tokens.push(Token::Text(text));
            }
            self.jump(end);
        }
    }
}

/// Replace named and numeric character references. Unknown references are
/// left as written.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
