use std::fmt;

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Instructions are newline-terminated, so the lexer keeps newlines.
    #[token("\n")]
    Newline,

    #[token("define")]
    Define,
    #[token("return")]
    Return,
    #[token("call")]
    Call,
    #[token("br")]
    Br,
    #[token("load")]
    Load,
    #[token("store")]
    Store,
    #[token("print")]
    Print,
    #[token("input")]
    Input,
    #[token("allocate")]
    Allocate,
    #[token("tuple-error")]
    TupleError,
    #[token("tensor-error")]
    TensorError,

    #[token("(")]
    LPar,
    #[token(")")]
    RPar,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token("<-")]
    Arrow,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,

    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token("=")]
    Eq,
    #[token(">=")]
    Ge,
    #[token(">")]
    Gt,

    #[regex(r"%[A-Za-z_][A-Za-z_0-9]*", |lex| lex.slice().to_owned())]
    Var(String),
    #[regex(r":[A-Za-z_][A-Za-z_0-9]*", |lex| lex.slice().to_owned())]
    Label(String),
    #[regex(r"@[A-Za-z_][A-Za-z_0-9]*", |lex| lex.slice().to_owned())]
    Func(String),
    #[regex(r"[+-]?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Num(i64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Token::*;
        match self {
            Newline => write!(f, "\\n"),
            Define => write!(f, "define"),
            Return => write!(f, "return"),
            Call => write!(f, "call"),
            Br => write!(f, "br"),
            Load => write!(f, "load"),
            Store => write!(f, "store"),
            Print => write!(f, "print"),
            Input => write!(f, "input"),
            Allocate => write!(f, "allocate"),
            TupleError => write!(f, "tuple-error"),
            TensorError => write!(f, "tensor-error"),
            LPar => write!(f, "("),
            RPar => write!(f, ")"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            Comma => write!(f, ","),
            Arrow => write!(f, "<-"),
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Star => write!(f, "*"),
            Amp => write!(f, "&"),
            Shl => write!(f, "<<"),
            Shr => write!(f, ">>"),
            Lt => write!(f, "<"),
            Le => write!(f, "<="),
            Eq => write!(f, "="),
            Ge => write!(f, ">="),
            Gt => write!(f, ">"),
            Var(x) | Label(x) | Func(x) => write!(f, "{}", x),
            Num(n) => write!(f, "{}", n),
        }
    }
}
