use ir::l3::{Cmp, Item, Op};
use util::Id;

#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Num(i64),
    Var(Id),
    Label(Id),
    Func(Id),
}

/// An expression tree built from one straight-line L3 instruction,
/// possibly grown by merging producers into it. Trees only exist
/// between context construction and tiling.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Leaf(Leaf),
    /// lhs is always a leaf naming the destination.
    Assign(Box<Tree>, Box<Tree>),
    BinOp(Op, Box<Tree>, Box<Tree>),
    Cmp(Cmp, Box<Tree>, Box<Tree>),
    /// (dst leaf, address expression)
    Load(Box<Tree>, Box<Tree>),
    /// (address expression, value expression)
    Store(Box<Tree>, Box<Tree>),
    Return(Option<Box<Tree>>),
    /// (label leaf, optional condition)
    Break(Box<Tree>, Option<Box<Tree>>),
}

impl Tree {
    pub fn leaf(item: &Item) -> Tree {
        let leaf = match item {
            Item::Num(n) => Leaf::Num(*n),
            Item::Var(v) => Leaf::Var(v.clone()),
            Item::Label(l) => Leaf::Label(l.clone()),
            Item::Func(f) => Leaf::Func(f.clone()),
        };
        Tree::Leaf(leaf)
    }

    pub fn var(v: &Id) -> Tree {
        Tree::Leaf(Leaf::Var(v.clone()))
    }

    /// The variable this tree defines, if it is `Assign(Leaf v, _)`.
    pub fn defined_var(&self) -> Option<&Id> {
        match self {
            Tree::Assign(lhs, _) => match lhs.as_ref() {
                Tree::Leaf(Leaf::Var(v)) => Some(v),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn uses_var(&self, v: &str) -> bool {
        match self {
            Tree::Leaf(Leaf::Var(x)) => x == v,
            Tree::Leaf(_) => false,
            Tree::Assign(l, r)
            | Tree::BinOp(_, l, r)
            | Tree::Cmp(_, l, r)
            | Tree::Load(l, r)
            | Tree::Store(l, r) => l.uses_var(v) || r.uses_var(v),
            Tree::Return(e) => e.as_ref().map_or(false, |e| e.uses_var(v)),
            Tree::Break(l, c) => l.uses_var(v) || c.as_ref().map_or(false, |c| c.uses_var(v)),
        }
    }

    /// Replaces every use of `v` with a clone of `replacement`.
    /// Destination leaves (an `Assign`'s or `Load`'s lhs) are left alone.
    pub fn substitute_uses(&mut self, v: &str, replacement: &Tree) {
        fn subst_at(node: &mut Tree, v: &str, replacement: &Tree) {
            if let Tree::Leaf(Leaf::Var(x)) = node {
                if x == v {
                    *node = replacement.clone();
                }
                return;
            }
            node.substitute_uses(v, replacement);
        }

        match self {
            Tree::Leaf(_) => {}
            Tree::Assign(_, rhs) => subst_at(rhs, v, replacement),
            Tree::Load(_, addr) => subst_at(addr, v, replacement),
            Tree::BinOp(_, l, r) | Tree::Cmp(_, l, r) | Tree::Store(l, r) => {
                subst_at(l, v, replacement);
                subst_at(r, v, replacement);
            }
            Tree::Return(e) => {
                if let Some(e) = e {
                    subst_at(e, v, replacement);
                }
            }
            Tree::Break(_, cond) => {
                if let Some(c) = cond {
                    subst_at(c, v, replacement);
                }
            }
        }
    }
}
