use logos::Logos;

use crate::error::{LexError, LexErrorKind};
use crate::token::Token;
use util::Spanned;

pub type Result = std::result::Result<(usize, Token, usize), LexError>;

pub struct Lexer<'input> {
    original: &'input str,
    tokens: logos::SpannedIter<'input, Token>,
}

impl<'input> Lexer<'input> {
    #[inline]
    pub fn new(src: &'input str) -> Self {
        Lexer {
            original: src,
            tokens: Token::lexer(src).spanned(),
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result;

    fn next(&mut self) -> Option<Result> {
        let (tok, span) = self.tokens.next()?;
        Some(match tok {
            Ok(t) => Ok((span.start, t, span.end)),
            Err(()) => {
                let text = self.original[span.clone()].to_owned();
                Err(Spanned::new(
                    LexErrorKind::UnrecognizedToken(text),
                    (span.start, span.end),
                ))
            }
        })
    }
}
