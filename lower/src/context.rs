use crate::liveness::LivenessSets;
use crate::tree::Tree;
use ir::l3::{Callee, Function, InstKind, Item};
use util::Id;

/// One node of a context: an expression tree, or an instruction kept
/// as-is because it is not part of any tree.
#[derive(Debug, Clone)]
pub enum Node {
    Tree { tree: Tree, live: LivenessSets },
    Label(Id),
    Call { callee: Callee, args: Vec<Item> },
    CallAssign { dst: Id, callee: Callee, args: Vec<Item> },
}

/// A maximal straight-line run of instructions. Bounded above by a
/// label or the function entry, below by a call, label, return, or
/// branch; the bounding instruction is the context's last node.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub nodes: Vec<Node>,
}

/// Partitions the body into contexts and gives every straight-line
/// instruction its tree shape. `live` must be the result of L3
/// liveness over the same body: node k of the flattened context list
/// carries the liveness record of instruction k.
pub fn build_contexts(f: &Function, live: &[LivenessSets]) -> Vec<Context> {
    let mut contexts = vec![Context::default()];

    fn push_tree(contexts: &mut Vec<Context>, tree: Tree, ls: &LivenessSets) {
        contexts.last_mut().unwrap().nodes.push(Node::Tree {
            tree,
            live: ls.clone(),
        });
    }
    fn push_node(contexts: &mut Vec<Context>, node: Node) {
        contexts.last_mut().unwrap().nodes.push(node);
    }
    fn end_context(contexts: &mut Vec<Context>) {
        contexts.push(Context::default());
    }

    for (inst, ls) in f.body.iter().zip(live) {
        match &inst.item {
            InstKind::Assign(d, s) => {
                let t = Tree::Assign(Box::new(Tree::var(d)), Box::new(Tree::leaf(s)));
                push_tree(&mut contexts, t, ls);
            }
            InstKind::Op(d, l, op, r) => {
                let rhs = Tree::BinOp(*op, Box::new(Tree::leaf(l)), Box::new(Tree::leaf(r)));
                let t = Tree::Assign(Box::new(Tree::var(d)), Box::new(rhs));
                push_tree(&mut contexts, t, ls);
            }
            InstKind::Cmp(d, l, c, r) => {
                let rhs = Tree::Cmp(*c, Box::new(Tree::leaf(l)), Box::new(Tree::leaf(r)));
                let t = Tree::Assign(Box::new(Tree::var(d)), Box::new(rhs));
                push_tree(&mut contexts, t, ls);
            }
            InstKind::Load(d, s) => {
                let t = Tree::Load(Box::new(Tree::var(d)), Box::new(Tree::var(s)));
                push_tree(&mut contexts, t, ls);
            }
            InstKind::Store(d, s) => {
                let t = Tree::Store(Box::new(Tree::var(d)), Box::new(Tree::leaf(s)));
                push_tree(&mut contexts, t, ls);
            }
            InstKind::Return => {
                push_tree(&mut contexts, Tree::Return(None), ls);
                end_context(&mut contexts);
            }
            InstKind::ReturnValue(t) => {
                let t = Tree::Return(Some(Box::new(Tree::leaf(t))));
                push_tree(&mut contexts, t, ls);
                end_context(&mut contexts);
            }
            InstKind::Label(l) => {
                push_node(&mut contexts, Node::Label(l.clone()));
                end_context(&mut contexts);
            }
            InstKind::Goto(l) => {
                let t = Tree::Break(Box::new(Tree::Leaf(crate::tree::Leaf::Label(l.clone()))), None);
                push_tree(&mut contexts, t, ls);
                end_context(&mut contexts);
            }
            InstKind::Branch(t, l) => {
                let tree = Tree::Break(
                    Box::new(Tree::Leaf(crate::tree::Leaf::Label(l.clone()))),
                    Some(Box::new(Tree::leaf(t))),
                );
                push_tree(&mut contexts, tree, ls);
                end_context(&mut contexts);
            }
            InstKind::Call(c, args) => {
                push_node(
                    &mut contexts,
                    Node::Call {
                        callee: c.clone(),
                        args: args.clone(),
                    },
                );
                end_context(&mut contexts);
            }
            InstKind::CallAssign(d, c, args) => {
                push_node(
                    &mut contexts,
                    Node::CallAssign {
                        dst: d.clone(),
                        callee: c.clone(),
                        args: args.clone(),
                    },
                );
                end_context(&mut contexts);
            }
        }
    }

    contexts.retain(|c| !c.nodes.is_empty());
    contexts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness;

    fn contexts_of(src: &str) -> Vec<Context> {
        let p = parser::parse(src).unwrap();
        let f = &p.functions[0];
        let live = liveness::analyze(f).unwrap();
        build_contexts(f, &live)
    }

    #[test]
    fn calls_labels_and_branches_delimit_contexts() {
        let ctxs = contexts_of(
            "define @f(%a) {\n\
             %b <- %a + 1\n\
             call print(%b)\n\
             %c <- %b - 1\n\
             :next\n\
             %d <- 2\n\
             br :next\n\
             return\n\
             }\n",
        );

        // [op, call] [op, label] [assign, br] [return]
        assert_eq!(ctxs.len(), 4);
        assert_eq!(ctxs[0].nodes.len(), 2);
        assert!(matches!(ctxs[0].nodes[1], Node::Call { .. }));
        assert!(matches!(ctxs[1].nodes[1], Node::Label(_)));
        assert_eq!(ctxs[3].nodes.len(), 1);
    }

    #[test]
    fn empty_contexts_are_dropped() {
        let ctxs = contexts_of(
            "define @f() {\n\
             :a\n\
             :b\n\
             return\n\
             }\n",
        );

        // the trailing context opened after `return` is empty and vanishes
        assert_eq!(ctxs.len(), 3);
        for c in &ctxs {
            assert!(!c.nodes.is_empty());
        }
    }

    #[test]
    fn node_order_matches_program_order() {
        let ctxs = contexts_of(
            "define @f(%a) {\n\
             %b <- 1\n\
             %c <- 2\n\
             return %a\n\
             }\n",
        );
        assert_eq!(ctxs.len(), 1);
        assert_eq!(ctxs[0].nodes.len(), 3);
        match &ctxs[0].nodes[2] {
            Node::Tree { tree, .. } => assert!(matches!(tree, Tree::Return(Some(_)))),
            _ => unreachable!(),
        }
    }
}
