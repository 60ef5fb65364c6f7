//! `libflint` is the library that powers the flint interpreter.
//!
//! flint is a small dynamically typed scripting language: a scanner turns
//! source text into tokens, a recursive-descent parser builds an abstract
//! syntax tree, and a tree-walking interpreter executes statements against a
//! chain of lexical scopes. The library exposes exactly that pipeline; the
//! `flint` binary is a thin shell that feeds it source text and translates
//! diagnostics into process exit codes.
//!
//! Errors travel two ways:
//! - scan and parse problems are collected in a [`core::Diagnostics`] sink
//!   while both stages keep going, so one run reports every compile-time
//!   problem it can find;
//! - the first runtime error unwinds out of [`core::Interpreter::interpret`]
//!   as a `std::result::Result` and ends the run.
#![warn(clippy::pedantic)]

pub mod core;
