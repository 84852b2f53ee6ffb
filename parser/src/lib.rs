pub mod error;
mod lexer;
mod token;

pub use error::ParseError as Error;

use ir::l3::Program;

#[macro_use]
extern crate lalrpop_util;

lalrpop_mod!(pub grammar);

#[inline]
pub fn parse(src: &str) -> Result<Program, Error> {
    let parser = grammar::ProgramParser::new();
    let lex = lexer::Lexer::new(src);

    parser.parse(lex).map_err(error::from_lalrpop)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use ir::l3::{Callee, Cmp, InstKind, Item, Op};

    #[test]
    fn parses_straight_line_function() {
        let p = parse(
            "define @main(%a, %b) {\n\
             %c <- %a + %b\n\
             return %c\n\
             }\n",
        )
        .unwrap();

        assert_eq!(p.functions.len(), 1);
        let f = &p.functions[0];
        assert_eq!(f.name, "@main");
        assert_eq!(f.params, vec!["%a".to_string(), "%b".to_string()]);
        assert_eq!(
            f.body[0].item,
            InstKind::Op(
                "%c".to_string(),
                Item::Var("%a".to_string()),
                Op::Add,
                Item::Var("%b".to_string())
            )
        );
        assert_eq!(
            f.body[1].item,
            InstKind::ReturnValue(Item::Var("%c".to_string()))
        );
    }

    #[test]
    fn parses_labels_branches_and_calls() {
        let p = parse(
            "define @f(%n) {\n\
             :top\n\
             %c <- %n < 10\n\
             br %c :top\n\
             br :done\n\
             :done\n\
             call print(%n)\n\
             %v <- call @g(%n, 1)\n\
             return\n\
             }\n",
        )
        .unwrap();

        let body: Vec<_> = p.functions[0].body.iter().map(|i| i.item.clone()).collect();
        assert_eq!(body[0], InstKind::Label(":top".to_string()));
        assert_eq!(
            body[1],
            InstKind::Cmp(
                "%c".to_string(),
                Item::Var("%n".to_string()),
                Cmp::Lt,
                Item::Num(10)
            )
        );
        assert_eq!(
            body[2],
            InstKind::Branch(Item::Var("%c".to_string()), ":top".to_string())
        );
        assert_eq!(body[3], InstKind::Goto(":done".to_string()));
        assert_eq!(
            body[5],
            InstKind::Call(Callee::Print, vec![Item::Var("%n".to_string())])
        );
        assert_eq!(
            body[6],
            InstKind::CallAssign(
                "%v".to_string(),
                Callee::Func("@g".to_string()),
                vec![Item::Var("%n".to_string()), Item::Num(1)]
            )
        );
    }

    #[test]
    fn newline_separates_return_from_next_instruction() {
        let p = parse(
            "define @f(%x) {\n\
             return\n\
             %y <- 1\n\
             return %y\n\
             }\n",
        )
        .unwrap();

        let body = &p.functions[0].body;
        assert_eq!(body[0].item, InstKind::Return);
        assert_eq!(
            body[1].item,
            InstKind::Assign("%y".to_string(), Item::Num(1))
        );
    }

    #[test]
    fn comments_and_blank_lines_are_insignificant() {
        let p = parse(
            "// leading comment\n\
             define @f() {\n\
             \n\
             %v <- load %v // trailing comment\n\
             store %v <- :lbl\n\
             :lbl\n\
             return\n\
             }\n",
        )
        .unwrap();

        let body = &p.functions[0].body;
        assert_eq!(
            body[0].item,
            InstKind::Load("%v".to_string(), "%v".to_string())
        );
        assert_eq!(
            body[1].item,
            InstKind::Store("%v".to_string(), Item::Label(":lbl".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("define @f( {\n return\n }\n").is_err());
        assert!(parse("define @f() {\n %v <- $3\n }\n").is_err());
    }
}
