//! Best-effort structural name extraction for saved-script labels.
//!
//! Python content is parsed for function and class definitions anywhere in
//! the tree; the last name that is not `main` in a level-order walk becomes
//! the label. Everything else, including unparseable content, falls back to
//! a UTC timestamp when the caller passed the default label.

use std::collections::VecDeque;

use chrono::Utc;
use rustpython_parser::{Parse, ast};

use crate::mode::Mode;

pub(crate) const DEFAULT_LABEL: &str = "script";

/// Derives the base filename (sans extension) for a saved script.
pub(crate) fn derive_label(initial: &str, content: &str, mode: Mode) -> String {
    if mode == Mode::Python
        && let Some(name) = python_definition_label(content)
    {
        return name;
    }
    if initial == DEFAULT_LABEL {
        format!("script_{}", Utc::now().format("%H%M%S"))
    } else {
        initial.to_string()
    }
}

/// Last function/class name defined in `content`, excluding `main`.
/// `None` when the source does not parse or defines nothing qualifying.
fn python_definition_label(content: &str) -> Option<String> {
    let suite = ast::Suite::parse(content.trim(), "<generated>").ok()?;
    let names = collect_definitions(&suite);
    names.into_iter().filter(|name| name != "main").next_back()
}

/// Harvests definition names level by level: every top-level name comes
/// before any nested one, and deeper nesting comes later still.
fn collect_definitions(suite: &[ast::Stmt]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut queue: VecDeque<&ast::Stmt> = suite.iter().collect();
    while let Some(stmt) = queue.pop_front() {
        match stmt {
            ast::Stmt::FunctionDef(def) => {
                names.push(def.name.to_string());
                queue.extend(&def.body);
            }
            ast::Stmt::AsyncFunctionDef(def) => {
                names.push(def.name.to_string());
                queue.extend(&def.body);
            }
            ast::Stmt::ClassDef(def) => {
                names.push(def.name.to_string());
                queue.extend(&def.body);
            }
            ast::Stmt::If(inner) => {
                queue.extend(&inner.body);
                queue.extend(&inner.orelse);
            }
            ast::Stmt::While(inner) => {
                queue.extend(&inner.body);
                queue.extend(&inner.orelse);
            }
            ast::Stmt::For(inner) => {
                queue.extend(&inner.body);
                queue.extend(&inner.orelse);
            }
            ast::Stmt::AsyncFor(inner) => {
                queue.extend(&inner.body);
                queue.extend(&inner.orelse);
            }
            ast::Stmt::With(inner) => queue.extend(&inner.body),
            ast::Stmt::AsyncWith(inner) => queue.extend(&inner.body),
            ast::Stmt::Try(inner) => {
                queue.extend(&inner.body);
                for handler in &inner.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    queue.extend(&handler.body);
                }
                queue.extend(&inner.orelse);
                queue.extend(&inner.finalbody);
            }
            ast::Stmt::TryStar(inner) => {
                queue.extend(&inner.body);
                for handler in &inner.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    queue.extend(&handler.body);
                }
                queue.extend(&inner.orelse);
                queue.extend(&inner.finalbody);
            }
            ast::Stmt::Match(inner) => {
                for case in &inner.cases {
                    queue.extend(&case.body);
                }
            }
            _ => {}
        }
    }
    names
}
