mod grammar;

use std::collections::VecDeque;
use std::rc::Rc;

use crate::ast::{Document, Expr, Extra, Extras, Location, Name};
use crate::lexer::Lexer;
use crate::{Error, Token, TokenKind};

/// Parse FSL schemas into a typed [`Document`].
///
/// ## Example
/// ```rust
/// use fsl_parser::Parser;
///
/// let input = r#"
/// function doubled(x: Int): Int {
///   x * 2
/// }
/// "#;
/// let document = Parser::new(input).filename("math.fsl").parse().unwrap();
/// let function = document.functions().next().unwrap();
/// assert_eq!("doubled", function.name.text);
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Up to two tokens of lookahead. Must be drained back to the lexer
    /// boundary before a raw expression-block capture.
    lookahead: VecDeque<Token<'a>>,
    file: Option<Rc<str>>,
    /// Comments and blank lines waiting to be anchored to the next node.
    pending: Vec<Extra>,
    prev_line: usize,
}

impl<'a> Parser<'a> {
    /// Create a new instance of a parser given an input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            lookahead: VecDeque::new(),
            file: None,
            pending: Vec::new(),
            prev_line: 1,
        }
    }

    /// Record the file name carried into every node position and error.
    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.file = Some(Rc::from(name.into().as_str()));
        self
    }

    /// Parse the input. The first syntax error aborts.
    pub fn parse(mut self) -> Result<Document, Error> {
        grammar::document(&mut self)
    }

    /// Next real token from the lexer, folding comments and blank-line gaps
    /// into [`pending`](Self::pending) trivia.
    fn fetch(&mut self) -> Result<Token<'a>, Error> {
        loop {
            let token = self
                .lexer
                .next_token()
                .map_err(|e| e.with_file(self.file.as_ref()))?;
            if token.line() > self.prev_line + 1 {
                self.pending.push(Extra::Blank);
            }
            self.prev_line = token.line();
            if token.kind() == TokenKind::Comment {
                self.pending.push(Extra::Comment(Rc::from(token.data())));
                continue;
            }
            return Ok(token);
        }
    }

    fn nth(&mut self, n: usize) -> Result<Token<'a>, Error> {
        while self.lookahead.len() <= n {
            let token = self.fetch()?;
            self.lookahead.push_back(token);
        }
        Ok(self.lookahead[n])
    }

    pub(crate) fn peek(&mut self) -> Result<Token<'a>, Error> {
        self.nth(0)
    }

    pub(crate) fn peek2(&mut self) -> Result<Token<'a>, Error> {
        self.nth(1)
    }

    pub(crate) fn pop(&mut self) -> Result<Token<'a>, Error> {
        self.nth(0)?;
        Ok(self.lookahead.pop_front().expect("lookahead filled by nth"))
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> Result<bool, Error> {
        Ok(self.peek()?.kind() == kind)
    }

    pub(crate) fn at_keyword(&mut self, keyword: &str) -> Result<bool, Error> {
        let token = self.peek()?;
        Ok(token.kind() == TokenKind::Name && token.data() == keyword)
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<bool, Error> {
        if self.at(kind)? {
            self.pop()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn eat_separators(&mut self) -> Result<(), Error> {
        while matches!(
            self.peek()?.kind(),
            TokenKind::Comma | TokenKind::Semicolon
        ) {
            self.pop()?;
        }
        Ok(())
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, Error> {
        let token = self.peek()?;
        if token.kind() == kind {
            self.pop()
        } else {
            Err(self.error(kind.describe(), &token))
        }
    }

    pub(crate) fn expect_name(&mut self) -> Result<Token<'a>, Error> {
        self.expect(TokenKind::Name)
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<Token<'a>, Error> {
        let token = self.peek()?;
        if token.kind() == TokenKind::Name && token.data() == keyword {
            self.pop()
        } else {
            Err(self.error(format!("`{keyword}`"), &token))
        }
    }

    pub(crate) fn expect_number(&mut self) -> Result<Token<'a>, Error> {
        let token = self.peek()?;
        if matches!(token.kind(), TokenKind::Int | TokenKind::Float) {
            self.pop()
        } else {
            Err(self.error("a number", &token))
        }
    }

    /// Capture a `{ ... }` FQL expression block verbatim.
    ///
    /// The opening brace must be the parser's next token with no lookahead
    /// beyond it, so the lexer's raw position is the block body's start.
    pub(crate) fn expr_block(&mut self) -> Result<Expr, Error> {
        let open = self.expect(TokenKind::LCurly)?;
        debug_assert!(
            self.lookahead.is_empty(),
            "lookahead crossed into an expression block"
        );
        let text = self.balanced('{', '}')?;
        Ok(Expr {
            text,
            loc: Some(self.location(&open)),
        })
    }

    /// Capture a `[ ... ]` term list verbatim.
    pub(crate) fn bracket_block(&mut self) -> Result<Expr, Error> {
        let open = self.expect(TokenKind::LBracket)?;
        debug_assert!(
            self.lookahead.is_empty(),
            "lookahead crossed into a term list"
        );
        let text = self.balanced('[', ']')?;
        Ok(Expr {
            text,
            loc: Some(self.location(&open)),
        })
    }

    fn balanced(&mut self, open: char, close: char) -> Result<String, Error> {
        let text = self
            .lexer
            .take_balanced(open, close)
            .map_err(|e| e.with_file(self.file.as_ref()))?
            .to_string();
        self.prev_line = self.lexer.line();
        Ok(text)
    }

    /// Hand out the trivia collected since the previous node.
    pub(crate) fn take_extras(&mut self) -> Extras {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn error(&self, expected: impl Into<String>, found: &Token<'_>) -> Error {
        Error::new(expected, found.describe(), found.line(), found.column())
            .with_file(self.file.as_ref())
    }

    pub(crate) fn location(&self, token: &Token<'_>) -> Location {
        Location {
            file: self.file.clone(),
            index: token.index(),
            line: token.line(),
            column: token.column(),
        }
    }

    pub(crate) fn name_node(&self, token: &Token<'_>) -> Name {
        Name {
            text: token.data().to_string(),
            loc: Some(self.location(token)),
        }
    }
}
