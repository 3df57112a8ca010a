//! Bracket-style rendering of expressions.
//!
//! A compound subterm used more than once is printed in full at its first
//! occurrence, labelled with its id (`@7=sum(x, 1u8)`), and as the bare label
//! `@7` afterwards, so the output stays linear in the size of the DAG.
//!
//! ```
//! use zen_rs::types::Type;
//! use zen_rs::zen::Zen;
//!
//! let zen = Zen::default();
//! let x = zen.arbitrary("x", Type::Bool);
//! let y = zen.arbitrary("y", Type::Bool);
//! let f = zen.and(x, zen.not(y).unwrap()).unwrap();
//! assert_eq!(zen.to_bracket_string(f), "and(x, not(y))");
//! ```
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::adapter::ConverterId;
use crate::node::{ArithOp, BitOp, CmpOp, MatchFn, Node};
use crate::reference::ExprRef;
use crate::types::{ObjectType, Type};
use crate::value::Literal;
use crate::visitor::Visitor;
use crate::zen::Zen;

/// Depth used by [`Zen::to_bracket_string`].
pub const DEFAULT_DEPTH: usize = 64;

/// Label of a node without its children, as used in renderings.
pub fn op_name(node: &Node) -> String {
    match node {
        Node::Constant(literal) => literal.to_string(),
        Node::Arbitrary { name, .. } => name.to_string(),
        Node::CreateObject { ty, .. } => format!("create<{}>", ty.name()),
        Node::GetField { field, .. } => format!("get.{}", field),
        Node::WithField { field, .. } => format!("with.{}", field),
        Node::Adapter { to, .. } => format!("adapt<{}>", to),
        _ => node.kind().to_string(),
    }
}

/// Renders up to a depth budget; deeper subterms print as `...`.
struct Printer {
    /// Compound nodes with several parents under the root.
    shared: HashSet<ExprRef>,
    printed: HashSet<ExprRef>,
}

impl Printer {
    fn new(zen: &Zen, root: ExprRef) -> Self {
        let mut uses: HashMap<ExprRef, usize> = HashMap::new();
        for e in zen.reachable(&[root]) {
            for c in zen.node(e).children() {
                *uses.entry(c).or_default() += 1;
            }
        }
        let shared = uses
            .into_iter()
            .filter(|&(e, n)| n > 1 && !zen.node(e).children().is_empty())
            .map(|(e, _)| e)
            .collect();
        Self {
            shared,
            printed: HashSet::new(),
        }
    }

    fn call(&mut self, zen: &Zen, name: &str, args: &[ExprRef], depth: usize) -> String {
        let args: Vec<String> = args.iter().map(|&a| self.print(zen, a, depth)).collect();
        format!("{}({})", name, args.join(", "))
    }

    fn print(&mut self, zen: &Zen, e: ExprRef, depth: usize) -> String {
        if depth == 0 {
            return "...".to_string();
        }
        if self.printed.contains(&e) {
            return e.to_string();
        }
        let s = zen.accept(e, self, depth - 1);
        if self.shared.contains(&e) {
            self.printed.insert(e);
            format!("{}={}", e, s)
        } else {
            s
        }
    }
}

impl Visitor for Printer {
    type Param = usize;
    type Output = String;

    fn visit_constant(&mut self, _: &Zen, _: ExprRef, literal: &Literal, _: usize) -> String {
        literal.to_string()
    }

    fn visit_arbitrary(&mut self, _: &Zen, _: ExprRef, name: &str, _: &Type, _: usize) -> String {
        name.to_string()
    }

    fn visit_not(&mut self, zen: &Zen, _: ExprRef, x: ExprRef, d: usize) -> String {
        self.call(zen, "not", &[x], d)
    }

    fn visit_and(&mut self, zen: &Zen, _: ExprRef, a: ExprRef, b: ExprRef, d: usize) -> String {
        self.call(zen, "and", &[a, b], d)
    }

    fn visit_or(&mut self, zen: &Zen, _: ExprRef, a: ExprRef, b: ExprRef, d: usize) -> String {
        self.call(zen, "or", &[a, b], d)
    }

    fn visit_bit_not(&mut self, zen: &Zen, _: ExprRef, x: ExprRef, d: usize) -> String {
        self.call(zen, "bitnot", &[x], d)
    }

    fn visit_bitwise(&mut self, zen: &Zen, e: ExprRef, _: BitOp, a: ExprRef, b: ExprRef, d: usize) -> String {
        self.call(zen, &op_name(&zen.node(e)), &[a, b], d)
    }

    fn visit_arith(&mut self, zen: &Zen, e: ExprRef, _: ArithOp, a: ExprRef, b: ExprRef, d: usize) -> String {
        self.call(zen, &op_name(&zen.node(e)), &[a, b], d)
    }

    fn visit_compare(&mut self, zen: &Zen, e: ExprRef, _: CmpOp, a: ExprRef, b: ExprRef, d: usize) -> String {
        self.call(zen, &op_name(&zen.node(e)), &[a, b], d)
    }

    fn visit_if(&mut self, zen: &Zen, _: ExprRef, g: ExprRef, t: ExprRef, f: ExprRef, d: usize) -> String {
        self.call(zen, "if", &[g, t, f], d)
    }

    fn visit_create_object(&mut self, zen: &Zen, _: ExprRef, ty: &Rc<ObjectType>, fields: &[ExprRef], d: usize) -> String {
        let fields: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, &f)| format!("{}={}", ty.field_name(i), self.print(zen, f, d)))
            .collect();
        format!("{}{{{}}}", ty.name(), fields.join(", "))
    }

    fn visit_get_field(&mut self, zen: &Zen, _: ExprRef, object: ExprRef, field: &str, d: usize) -> String {
        format!("get({}, {})", self.print(zen, object, d), field)
    }

    fn visit_with_field(&mut self, zen: &Zen, _: ExprRef, object: ExprRef, field: &str, value: ExprRef, d: usize) -> String {
        let object = self.print(zen, object, d);
        let value = self.print(zen, value, d);
        format!("with({}, {}, {})", object, field, value)
    }

    fn visit_list_empty(&mut self, _: &Zen, _: ExprRef, _: &Type, _: usize) -> String {
        "[]".to_string()
    }

    fn visit_list_cons(&mut self, zen: &Zen, _: ExprRef, head: ExprRef, tail: ExprRef, d: usize) -> String {
        self.call(zen, "cons", &[head, tail], d)
    }

    fn visit_list_match(&mut self, zen: &Zen, _: ExprRef, list: ExprRef, empty: ExprRef, _: &MatchFn, d: usize) -> String {
        let list = self.print(zen, list, d);
        let empty = self.print(zen, empty, d);
        format!("match({}, {}, <fn>)", list, empty)
    }

    fn visit_adapter(
        &mut self,
        zen: &Zen,
        _: ExprRef,
        x: ExprRef,
        to: &Type,
        converters: &[ConverterId],
        d: usize,
    ) -> String {
        let names: Vec<String> = converters.iter().map(|&id| zen.converter_name(id)).collect();
        format!("adapt<{}>[{}]({})", to, names.join(", "), self.print(zen, x, d))
    }
}

impl Zen {
    /// Render `e` in bracket style.
    pub fn to_bracket_string(&self, e: ExprRef) -> String {
        self.to_bracket_string_with_depth(e, DEFAULT_DEPTH)
    }

    pub fn to_bracket_string_with_depth(&self, e: ExprRef, depth: usize) -> String {
        Printer::new(self, e).print(self, e, depth.max(1))
    }
}
