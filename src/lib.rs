//! # zen-rs: simplification of typed symbolic expressions
//!
//! **`zen-rs`** builds expressions of a small typed language (booleans,
//! fixed-width and unbounded integers, records, lists) as a hash-consed DAG and
//! rewrites them into a simplified normal form before they are handed to a
//! solver backend or evaluated.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All expressions are built through the [`Zen`][crate::zen::Zen] manager, which interns structurally equal nodes, so handle equality means structural equality.
//! - **Lightweight Handles**: Nodes are referred to by `Copy` [`ExprRef`][crate::reference::ExprRef] handles. Ids start at 1 and children always have smaller ids than their parents.
//! - **Typed Construction**: Ill-typed expressions and unknown fields are rejected when they are built, with a distinguishable [`Error`][crate::error::Error].
//! - **Memoized Simplification**: The [`Simplifier`][crate::simplify::Simplifier] rewrites each distinct node once per pass, keeps shared subterms shared, and never recurses on the call stack.
//!
//! ## Basic Usage
//!
//! ```rust
//! use zen_rs::eval::Assignment;
//! use zen_rs::types::Type;
//! use zen_rs::value::Value;
//! use zen_rs::zen::Zen;
//!
//! // 1. Initialize the manager
//! let zen = Zen::default();
//!
//! // 2. Create free variables
//! let x = zen.arbitrary("x", Type::Bool);
//! let t = zen.bool(true);
//!
//! // 3. Build a formula: f = NOT(NOT(x AND true))
//! let f = zen.not(zen.not(zen.and(x, t).unwrap()).unwrap()).unwrap();
//!
//! // 4. Simplify: the result is the very same node as x
//! assert_eq!(zen.simplify(f).unwrap(), x);
//!
//! // 5. Evaluate with x = false
//! let mut assignment = Assignment::new();
//! assignment.set(x, false);
//! assert_eq!(zen.evaluate(f, &assignment).unwrap(), Value::Bool(false));
//! ```
//!
//! ## Core Components
//!
//! - **[`zen`]**: The manager, typed constructors and [`ZenConfig`][crate::zen::ZenConfig].
//! - **[`simplify`]**: The rewrite engine and its rule set.
//! - **[`visitor`]**: Per-kind dispatch used by every algorithm over expressions.
//! - **[`eval`]**: Concrete evaluation under an assignment.
//! - **[`dot`]**: Utilities for visualizing expression DAGs using Graphviz.

pub mod adapter;
pub mod cache;
pub mod display;
pub mod dot;
pub mod error;
pub mod eval;
pub mod node;
pub mod reference;
pub mod simplify;
pub mod table;
pub mod types;
pub mod utils;
pub mod value;
pub mod visitor;
pub mod zen;
