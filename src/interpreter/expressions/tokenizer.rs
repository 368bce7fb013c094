//! Expression tokenizer

use super::EvalLimits;
use crate::interpreter::errors::EvalError;
use crate::interpreter::types::Value;
use crate::interpreter::variables::VariableStore;

/* ===================== Tokens ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,
    Pos,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Not,
}

impl Op {
    pub fn is_unary(self) -> bool {
        matches!(self, Op::Neg | Op::Pos | Op::Not)
    }

    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            Op::Or => 1,
            Op::And => 2,
            Op::Not => 3,
            Op::Eq | Op::Ne | Op::Lt | Op::Gt | Op::Le | Op::Ge => 4,
            Op::Add | Op::Sub => 5,
            Op::Mul | Op::Div | Op::Mod => 6,
            Op::Neg | Op::Pos => 7,
            Op::Pow => 8,
        }
    }

    pub fn is_right_assoc(self) -> bool {
        matches!(self, Op::Pow)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add | Op::Pos => "+",
            Op::Sub | Op::Neg => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Mod => "MOD",
            Op::Pow => "^",
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Le => "<=",
            Op::Ge => ">=",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Number, string literal or an interpolated `*NAME*` value
    Literal(Value),
    /// Upper-cased variable or constant name
    Ident(String),
    /// Upper-cased name immediately followed by `(`
    Func(String),
    Op(Op),
    LParen,
    RParen,
    Comma,
}

/* ===================== Tokenizer ===================== */

/// Split an expression into tokens, enforcing the token budget
pub fn tokenize(
    expr: &str,
    vars: &VariableStore,
    limits: &EvalLimits,
) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let operand_position = expects_operand(tokens.last());
        let token = if c.is_ascii_digit() || (c == '.' && peek_digit(&chars, i + 1)) {
            let (value, next) = read_number(&chars, i)?;
            i = next;
            Token::Literal(value)
        } else if c == '"' || c == '\'' {
            let close = chars[i + 1..]
                .iter()
                .position(|&q| q == c)
                .ok_or_else(|| EvalError::syntax("unterminated string literal"))?;
            let text: String = chars[i + 1..i + 1 + close].iter().collect();
            i += close + 2;
            Token::Literal(Value::Text(text))
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            if i < chars.len() && chars[i] == '$' {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect::<String>().to_ascii_uppercase();
            match word.as_str() {
                "AND" => Token::Op(Op::And),
                "OR" => Token::Op(Op::Or),
                "NOT" => Token::Op(Op::Not),
                "MOD" => Token::Op(Op::Mod),
                _ if next_non_space(&chars, i) == Some('(') => Token::Func(word),
                _ => Token::Ident(word),
            }
        } else if c == '*' && operand_position {
            let (value, next) = read_interpolation(&chars, i, vars)?;
            i = next;
            Token::Literal(value)
        } else {
            let (token, width) = read_symbol(&chars, i, operand_position)?;
            i += width;
            token
        };

        tokens.push(token);
        if tokens.len() > limits.max_tokens {
            return Err(EvalError::ComplexityExceeded {
                reason: format!("more than {} tokens", limits.max_tokens),
            });
        }
    }

    Ok(tokens)
}

/// True when the next token must start an operand
fn expects_operand(prev: Option<&Token>) -> bool {
    matches!(
        prev,
        None | Some(Token::Op(_)) | Some(Token::LParen) | Some(Token::Comma) | Some(Token::Func(_))
    )
}

fn peek_digit(chars: &[char], i: usize) -> bool {
    chars.get(i).map_or(false, |c| c.is_ascii_digit())
}

fn next_non_space(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    chars.get(i).copied()
}

fn read_number(chars: &[char], start: usize) -> Result<(Value, usize), EvalError> {
    let mut i = start;
    let mut is_float = false;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if peek_digit(chars, j) {
            is_float = true;
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text: String = chars[start..i].iter().collect();
    if !is_float {
        if let Ok(n) = text.parse::<i64>() {
            return Ok((Value::Integer(n), i));
        }
    }
    text.parse::<f64>()
        .map(|f| (Value::Float(f), i))
        .map_err(|_| EvalError::syntax(format!("invalid number `{}`", text)))
}

/// `*NAME*` in operand position: the value of a known variable
fn read_interpolation(
    chars: &[char],
    start: usize,
    vars: &VariableStore,
) -> Result<(Value, usize), EvalError> {
    let close = chars[start + 1..]
        .iter()
        .position(|&c| c == '*')
        .ok_or_else(|| EvalError::syntax("unexpected `*`"))?;
    let name: String = chars[start + 1..start + 1 + close].iter().collect();
    let is_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if !is_name {
        return Err(EvalError::syntax("unexpected `*`"));
    }
    match vars.get(&name) {
        Some(value) => Ok((value.clone(), start + close + 2)),
        None => Err(EvalError::UnknownSymbol {
            name: name.to_ascii_uppercase(),
        }),
    }
}

fn read_symbol(
    chars: &[char],
    i: usize,
    operand_position: bool,
) -> Result<(Token, usize), EvalError> {
    let next = chars.get(i + 1).copied();
    let token = match (chars[i], next) {
        ('<', Some('=')) => return Ok((Token::Op(Op::Le), 2)),
        ('<', Some('>')) => return Ok((Token::Op(Op::Ne), 2)),
        ('>', Some('=')) => return Ok((Token::Op(Op::Ge), 2)),
        ('=', Some('=')) => return Ok((Token::Op(Op::Eq), 2)),
        ('!', Some('=')) => return Ok((Token::Op(Op::Ne), 2)),
        ('+', _) if operand_position => Token::Op(Op::Pos),
        ('-', _) if operand_position => Token::Op(Op::Neg),
        ('+', _) => Token::Op(Op::Add),
        ('-', _) => Token::Op(Op::Sub),
        ('*', _) => Token::Op(Op::Mul),
        ('/', _) => Token::Op(Op::Div),
        ('%', _) => Token::Op(Op::Mod),
        ('^', _) => Token::Op(Op::Pow),
        ('=', _) => Token::Op(Op::Eq),
        ('<', _) => Token::Op(Op::Lt),
        ('>', _) => Token::Op(Op::Gt),
        ('(', _) => Token::LParen,
        (')', _) => Token::RParen,
        (',', _) => Token::Comma,
        (other, _) => {
            return Err(EvalError::syntax(format!("unexpected character `{}`", other)));
        }
    };
    Ok((token, 1))
}
