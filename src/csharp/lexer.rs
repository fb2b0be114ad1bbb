/// Token categories produced by [`tokenize`].
///
/// Literals are kept as opaque tokens so that braces or quotes inside them
/// never disturb the declaration parser's brace matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Char,
    Punct(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// 1-based line.
    pub line: u32,
    /// 1-based column, counted in chars.
    pub column: u32,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

struct Cursor<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: u32,
    column: u32,
    at_line_start: bool,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Cursor {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = *self.chars.get(self.pos)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) {
        // Opening "/*" already consumed.
        while let Some(c) = self.bump() {
            if c == '*' && self.peek(0) == Some('/') {
                self.bump();
                return;
            }
        }
    }

    fn skip_regular_string(&mut self) {
        // Opening quote already consumed.
        while let Some(c) = self.peek(0) {
            match c {
                '\\' => self.bump_n(2),
                '"' => {
                    self.bump();
                    return;
                }
                '\n' => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn skip_verbatim_string(&mut self) {
        // Opening quote already consumed.
        while let Some(c) = self.bump() {
            if c == '"' {
                if self.peek(0) == Some('"') {
                    self.bump();
                } else {
                    return;
                }
            }
        }
    }

    /// Skip a raw string whose opening run of `quotes` quotes was consumed.
    fn skip_raw_string(&mut self, quotes: usize) {
        while self.peek(0).is_some() {
            if self.count_run('"') >= quotes {
                self.bump_n(quotes);
                return;
            }
            self.bump();
        }
    }

    fn count_run(&self, c: char) -> usize {
        let mut n = 0;
        while self.peek(n) == Some(c) {
            n += 1;
        }
        n
    }

    fn skip_interpolated_string(&mut self, verbatim: bool) {
        // Opening quote already consumed.
        while let Some(c) = self.peek(0) {
            match c {
                '\\' if !verbatim => self.bump_n(2),
                '"' => {
                    self.bump();
                    if verbatim && self.peek(0) == Some('"') {
                        self.bump();
                        continue;
                    }
                    return;
                }
                '{' if self.peek(1) == Some('{') => self.bump_n(2),
                '{' => {
                    self.bump();
                    self.skip_interpolation_hole();
                }
                '\n' if !verbatim => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn skip_interpolation_hole(&mut self) {
        // Opening brace already consumed.
        let mut depth = 1usize;
        while let Some(c) = self.peek(0) {
            match c {
                '{' => {
                    depth += 1;
                    self.bump();
                }
                '}' => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                '"' | '@' | '$' | '\'' => {
                    if !self.skip_literal() {
                        self.bump();
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Skip a string or char literal starting at the cursor.
    ///
    /// Returns the literal's kind, or `None` when the cursor is not on one.
    fn try_skip_literal(&mut self) -> Option<TokenKind> {
        let c0 = self.peek(0)?;
        let c1 = self.peek(1);
        let c2 = self.peek(2);
        match (c0, c1, c2) {
            ('"', _, _) => {
                let quotes = self.count_run('"');
                if quotes >= 3 {
                    self.bump_n(quotes);
                    self.skip_raw_string(quotes);
                } else {
                    self.bump();
                    self.skip_regular_string();
                }
                Some(TokenKind::Str)
            }
            ('@', Some('"'), _) => {
                self.bump_n(2);
                self.skip_verbatim_string();
                Some(TokenKind::Str)
            }
            ('@', Some('$'), Some('"')) | ('$', Some('@'), Some('"')) => {
                self.bump_n(3);
                self.skip_interpolated_string(true);
                Some(TokenKind::Str)
            }
            ('$', _, _) => {
                let dollars = self.count_run('$');
                let quotes = {
                    let mut n = 0;
                    while self.peek(dollars + n) == Some('"') {
                        n += 1;
                    }
                    n
                };
                if quotes == 0 {
                    return None;
                }
                self.bump_n(dollars);
                if quotes >= 3 {
                    self.bump_n(quotes);
                    self.skip_raw_string(quotes);
                } else {
                    self.bump();
                    self.skip_interpolated_string(false);
                }
                Some(TokenKind::Str)
            }
            ('\'', _, _) => {
                self.bump();
                while let Some(c) = self.peek(0) {
                    match c {
                        '\\' => self.bump_n(2),
                        '\'' => {
                            self.bump();
                            break;
                        }
                        '\n' => break,
                        _ => {
                            self.bump();
                        }
                    }
                }
                Some(TokenKind::Char)
            }
            _ => None,
        }
    }

    fn skip_literal(&mut self) -> bool {
        self.try_skip_literal().is_some()
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Split C# source into tokens, dropping trivia.
///
/// Whitespace, comments and preprocessor lines are discarded. Every branch of
/// `#if` blocks is tokenized. Unterminated literals and comments run to the end
/// of the input; this never fails.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek(0) {
        if c.is_whitespace() {
            if c == '\n' {
                cursor.at_line_start = true;
            }
            cursor.bump();
            continue;
        }

        if c == '#' && cursor.at_line_start {
            cursor.skip_line();
            continue;
        }

        if c == '/' && cursor.peek(1) == Some('/') {
            cursor.skip_line();
            continue;
        }

        if c == '/' && cursor.peek(1) == Some('*') {
            cursor.bump_n(2);
            cursor.skip_block_comment();
            continue;
        }

        cursor.at_line_start = false;
        let start = cursor.offset();
        let line = cursor.line;
        let column = cursor.column;

        let kind = if let Some(kind) = cursor.try_skip_literal() {
            kind
        } else if is_ident_start(c)
            || (c == '@' && cursor.peek(1).is_some_and(is_ident_start))
        {
            cursor.bump();
            while cursor.peek(0).is_some_and(is_ident_continue) {
                cursor.bump();
            }
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            cursor.bump();
            while let Some(next) = cursor.peek(0) {
                let continues = is_ident_continue(next)
                    || (next == '.' && cursor.peek(1).is_some_and(|d| d.is_ascii_digit()));
                if !continues {
                    break;
                }
                cursor.bump();
            }
            TokenKind::Number
        } else {
            cursor.bump();
            TokenKind::Punct(c)
        };

        tokens.push(Token {
            kind,
            start,
            end: cursor.offset(),
            line,
            column,
        });
    }

    tokens
}
