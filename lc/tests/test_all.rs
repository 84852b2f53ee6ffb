use lc::*;

use std::fs;

fn read_dir(path: &str) -> Vec<String> {
    let dir = fs::read_dir(path).unwrap();
    dir.into_iter()
        .map(|x| x.unwrap().path().into_os_string().into_string().unwrap())
        .collect()
}

fn dummy_arg(path: &str) -> Args {
    Args {
        verbose: false,
        liveness: false,
        interference: false,
        generate: 0,
        opt_level: 0,
        source: path.to_string(),
    }
}

#[test]
fn test_all_sources() {
    let srcs = read_dir("tests/sources/");
    assert!(!srcs.is_empty());

    for src in srcs {
        println!("testing {}", src);
        assert!(compile(dummy_arg(&src)).is_ok());
    }
}

/// The register `movq %rdi, X` wrote to, if the line is such a move.
fn move_target<'a>(line: &'a str, src: &str) -> Option<&'a str> {
    let rest = line.trim().strip_prefix("movq ")?;
    let (from, to) = rest.split_once(", ")?;
    (from == src).then_some(to)
}

#[test]
fn identity_moves_the_argument_into_rax() {
    let asm = compile_source("define @id(%x) {\n return %x\n }\n").unwrap();

    // %x materializes out of rdi into some register r, and r reaches rax
    let r = asm
        .lines()
        .find_map(|l| move_target(l, "%rdi"))
        .expect("no move out of rdi");
    let reaches_rax = asm
        .lines()
        .any(|l| move_target(l, r) == Some("%rax"));
    assert!(reaches_rax, "{} never reaches rax:\n{}", r, asm);
    assert!(asm.contains("  retq\n"));
}

#[test]
fn add_performs_an_addq_into_rax() {
    let asm =
        compile_source("define @add(%a, %b) {\n %c <- %a + %b\n return %c\n }\n").unwrap();

    assert!(asm.contains("addq"), "{}", asm);
    assert!(asm.contains(", %rax\n"), "{}", asm);
}

#[test]
fn loop_compiles_without_any_frame() {
    let asm = compile_source(
        "define @loop(%n) {\n\
         %i <- 0\n\
         :top\n\
         %c <- %i < %n\n\
         br %c :body\n\
         br :end\n\
         :body\n\
         %i <- %i + 1\n\
         br :top\n\
         :end\n\
         return %i\n\
         }\n",
    )
    .unwrap();

    // no calls and no spills: the frame is never adjusted
    assert!(!asm.contains("subq"), "{}", asm);
    // the compare feeds the branch: setl materializes the flag, and
    // the branch tests it against 1
    assert!(asm.contains("cmpq"), "{}", asm);
    assert!(asm.contains("setl"), "{}", asm);
    assert!(asm.contains("je "), "{}", asm);
}

#[test]
fn variable_shift_ends_up_in_cl() {
    let asm =
        compile_source("define @shl(%x, %y) {\n %r <- %x << %y\n return %r\n }\n").unwrap();

    assert!(asm.contains("salq %cl, "), "{}", asm);
}

#[test]
fn value_live_across_print_survives_in_the_frame() {
    let asm = compile_source(
        "define @f(%x) {\n\
         %v <- %x + 1\n\
         call print(%x)\n\
         return %v\n\
         }\n",
    )
    .unwrap();

    // the frame holds the value across the call
    assert!(asm.contains("(%rsp)"), "{}", asm);
    assert!(asm.contains("  call print\n"), "{}", asm);
}

#[test]
fn twenty_live_values_spill_into_the_frame() {
    let mut src = String::from("define @main() {\n");
    for i in 0..20 {
        src.push_str(&format!("%v{} <- {}\n", i, i));
    }
    src.push_str("%s <- %v0 + %v1\n");
    for i in 2..20 {
        src.push_str(&format!("%s <- %s + %v{}\n", i));
    }
    src.push_str("return %s\n}\n");

    let asm = compile_source(&src).unwrap();

    // the frame is allocated, loads/stores go through rsp, and it is
    // restored before returning
    assert!(asm.contains("_main:\n  subq $"), "{}", asm);
    assert!(asm.contains("(%rsp)"), "{}", asm);
    assert!(asm.contains("  addq $"), "{}", asm);
}

#[test]
fn calls_store_a_return_label_below_rsp() {
    let asm = compile_source(
        "define @main() {\n\
         %r <- call @g(1, 2)\n\
         call print(%r)\n\
         return\n\
         }\n\
         define @g(%a, %b) {\n\
         %s <- %a + %b\n\
         return %s\n\
         }\n",
    )
    .unwrap();

    assert!(asm.contains(", -8(%rsp)\n"), "{}", asm);
    assert!(asm.contains("  jmp _g\n"), "{}", asm);
    // go wrapper calls the entry point
    assert!(asm.contains("  call _main\n"), "{}", asm);
}

#[test]
fn labels_do_not_collide_across_functions() {
    let asm = compile_source(
        "define @f() {\n\
         :loop\n\
         br :loop\n\
         }\n\
         define @g() {\n\
         :loop\n\
         br :loop\n\
         }\n",
    )
    .unwrap();

    // both loops exist, under distinct globalized names
    let defs: Vec<&str> = asm
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("_loop_global_") && l.ends_with(':'))
        .collect();
    assert_eq!(defs.len(), 2);
    assert_ne!(defs[0], defs[1]);
}
