//! Infix → postfix conversion (shunting-yard)

use super::tokenizer::{Op, Token};
use super::EvalLimits;
use crate::interpreter::errors::EvalError;
use crate::interpreter::types::Value;

/// Postfix instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Rpn {
    Push(Value),
    Load(String),
    Apply(Op),
    Call { name: String, argc: usize },
}

enum Pending {
    Op(Op),
    Group,
    Call(String),
}

struct CallFrame {
    argc: usize,
    has_arg: bool,
}

/// Reorder tokens into postfix form, validating structure and nesting depth
pub fn to_postfix(tokens: Vec<Token>, limits: &EvalLimits) -> Result<Vec<Rpn>, EvalError> {
    if tokens.is_empty() {
        return Err(EvalError::syntax("empty expression"));
    }

    let mut out: Vec<Rpn> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Pending> = Vec::new();
    let mut calls: Vec<CallFrame> = Vec::new();
    let mut depth = 0usize;
    let mut expect_operand = true;
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if expect_operand {
            if let Some(frame) = calls.last_mut() {
                if !matches!(token, Token::RParen) && innermost_is_call(&stack) {
                    frame.has_arg = true;
                }
            }
        }

        match token {
            Token::Literal(value) => {
                require_operand(expect_operand)?;
                out.push(Rpn::Push(value));
                expect_operand = false;
            }
            Token::Ident(name) => {
                require_operand(expect_operand)?;
                out.push(Rpn::Load(name));
                expect_operand = false;
            }
            Token::Func(name) => {
                require_operand(expect_operand)?;
                match iter.next() {
                    Some(Token::LParen) => {}
                    _ => return Err(EvalError::syntax(format!("expected `(` after {}", name))),
                }
                depth += 1;
                check_depth(depth, limits)?;
                stack.push(Pending::Call(name));
                calls.push(CallFrame {
                    argc: 0,
                    has_arg: false,
                });
            }
            Token::LParen => {
                require_operand(expect_operand)?;
                depth += 1;
                check_depth(depth, limits)?;
                stack.push(Pending::Group);
            }
            Token::Op(op) if op.is_unary() => {
                require_operand(expect_operand)?;
                stack.push(Pending::Op(op));
            }
            Token::Op(op) => {
                if expect_operand {
                    return Err(EvalError::syntax(format!(
                        "operator `{}` is missing its left operand",
                        op.symbol()
                    )));
                }
                while let Some(Pending::Op(top)) = stack.last() {
                    let top = *top;
                    let binds_tighter = top.precedence() > op.precedence()
                        || (top.precedence() == op.precedence() && !op.is_right_assoc());
                    if !binds_tighter {
                        break;
                    }
                    out.push(Rpn::Apply(top));
                    stack.pop();
                }
                stack.push(Pending::Op(op));
                expect_operand = true;
            }
            Token::Comma => {
                if expect_operand {
                    return Err(EvalError::syntax("missing function argument"));
                }
                drain_operators(&mut stack, &mut out);
                match (stack.last(), calls.last_mut()) {
                    (Some(Pending::Call(_)), Some(frame)) => {
                        frame.argc += 1;
                        frame.has_arg = false;
                    }
                    _ => return Err(EvalError::syntax("unexpected `,`")),
                }
                expect_operand = true;
            }
            Token::RParen => {
                let empty_call = expect_operand
                    && matches!(stack.last(), Some(Pending::Call(_)))
                    && calls.last().map_or(false, |f| f.argc == 0 && !f.has_arg);
                if expect_operand && !empty_call {
                    return Err(EvalError::syntax("unexpected `)`"));
                }
                drain_operators(&mut stack, &mut out);
                match stack.pop() {
                    Some(Pending::Group) => {}
                    Some(Pending::Call(name)) => {
                        let frame = calls
                            .pop()
                            .ok_or_else(|| EvalError::syntax("unbalanced parentheses"))?;
                        let argc = if empty_call { 0 } else { frame.argc + 1 };
                        out.push(Rpn::Call { name, argc });
                    }
                    _ => return Err(EvalError::syntax("unbalanced parentheses")),
                }
                depth -= 1;
                expect_operand = false;
            }
        }
    }

    if expect_operand {
        return Err(EvalError::syntax("expression ends with an operator"));
    }
    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Op(op) => out.push(Rpn::Apply(op)),
            Pending::Group | Pending::Call(_) => {
                return Err(EvalError::syntax("unbalanced parentheses"))
            }
        }
    }
    Ok(out)
}

fn require_operand(expect_operand: bool) -> Result<(), EvalError> {
    if expect_operand {
        Ok(())
    } else {
        Err(EvalError::syntax("missing operator between operands"))
    }
}

fn check_depth(depth: usize, limits: &EvalLimits) -> Result<(), EvalError> {
    if depth > limits.max_depth {
        return Err(EvalError::ComplexityExceeded {
            reason: format!("nesting deeper than {}", limits.max_depth),
        });
    }
    Ok(())
}

fn innermost_is_call(stack: &[Pending]) -> bool {
    stack
        .iter()
        .rev()
        .find(|p| !matches!(p, Pending::Op(_)))
        .map_or(false, |p| matches!(p, Pending::Call(_)))
}

fn drain_operators(stack: &mut Vec<Pending>, out: &mut Vec<Rpn>) {
    while let Some(Pending::Op(op)) = stack.last() {
        out.push(Rpn::Apply(*op));
        stack.pop();
    }
}
