use crate::ast::{Expr, ExprKind, LiteralValue};
use crate::stack::ensure_sufficient_stack;

/// Renders an expression in the Crafting‑Interpreters prefix form used by
/// the `parse` command.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        ensure_sufficient_stack(|| Self::print_inner(expr))
    }

    fn print_inner(expr: &Expr) -> String {
        match &expr.kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),
                LiteralValue::False => "false".into(),
                LiteralValue::Nil => "nil".into(),
                LiteralValue::Str(s) => s.clone(),
                // 3 → "3.0"
                LiteralValue::Number(n) if n.fract() == 0.0 => format!("{:.1}", n),
                LiteralValue::Number(n) => n.to_string(),
            },

            ExprKind::Grouping(inner) => format!("(group {})", Self::print(inner)),

            ExprKind::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            ExprKind::Variable(name) => name.lexeme.clone(),

            ExprKind::Assign { name, value } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            ExprKind::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            ExprKind::Get { object, name } => {
                format!("(. {} {})", Self::print(object), name.lexeme)
            }

            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            ExprKind::This(_) => "this".into(),

            ExprKind::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}
