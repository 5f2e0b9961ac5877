//! Calculator tool
//!
//! Evaluates a restricted arithmetic expression language: numbers, the
//! operators `+ - * / % **`, parentheses, a whitelisted set of functions
//! (`abs round min max sum pow sqrt sin cos tan`) and the constants `pi`
//! and `e`. Anything outside that language is rejected with an error
//! string; nothing is ever executed. The whitelist is a sandboxing
//! boundary, not a general evaluator.
//!
//! Integer arithmetic stays integral (`2 + 2` is `4`); division and the
//! math functions produce floats (`sqrt(16)` is `4.0`), matching the usual
//! numeric-tower conventions.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::tool::{Tool, ToolResult};
use crate::llm::{ToolDefinition, ToolInputSchema};

/// Tool evaluating whitelisted arithmetic expressions
pub struct CalculatorTool;

#[derive(Debug, Deserialize)]
struct CalculatorInput {
    expression: String,
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression safely (e.g. \"2 + 2\", \"sqrt(16)\"). \
         Supports + - * / % **, parentheses, abs, round, min, max, sum, pow, \
         sqrt, sin, cos, tan, and the constants pi and e."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: ToolInputSchema::single_string(
                "expression",
                "The mathematical expression to evaluate",
            ),
        }
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let input: CalculatorInput = serde_json::from_value(input.clone())
            .map_err(|e| anyhow::anyhow!("Invalid calculator input: {}", e))?;

        match evaluate(&input.expression) {
            Ok(value) => Ok(ToolResult::success(value.to_string())),
            Err(e) => Ok(ToolResult::error(format!(
                "Error calculating expression: {}",
                e
            ))),
        }
    }
}

// ============================================================================
// Numeric values
// ============================================================================

/// An evaluated value, keeping integers integral until an operation
/// promotes them
#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn to_string(self) -> String {
        match self {
            Num::Int(i) => i.to_string(),
            // {:?} keeps a trailing .0 on whole floats
            Num::Float(f) => format!("{:?}", f),
        }
    }
}

fn add(a: Num, b: Num) -> Result<Num, String> {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => a
            .checked_add(b)
            .map(Num::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        _ => Ok(Num::Float(a.as_f64() + b.as_f64())),
    }
}

fn sub(a: Num, b: Num) -> Result<Num, String> {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => a
            .checked_sub(b)
            .map(Num::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        _ => Ok(Num::Float(a.as_f64() - b.as_f64())),
    }
}

fn mul(a: Num, b: Num) -> Result<Num, String> {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => a
            .checked_mul(b)
            .map(Num::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        _ => Ok(Num::Float(a.as_f64() * b.as_f64())),
    }
}

/// True division: always a float
fn div(a: Num, b: Num) -> Result<Num, String> {
    if b.as_f64() == 0.0 {
        return Err("division by zero".to_string());
    }
    Ok(Num::Float(a.as_f64() / b.as_f64()))
}

fn rem(a: Num, b: Num) -> Result<Num, String> {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => {
            if b == 0 {
                Err("division by zero".to_string())
            } else {
                Ok(Num::Int(a.rem_euclid(b)))
            }
        }
        _ => {
            if b.as_f64() == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(Num::Float(a.as_f64().rem_euclid(b.as_f64())))
            }
        }
    }
}

fn pow(a: Num, b: Num) -> Result<Num, String> {
    match (a, b) {
        (Num::Int(base), Num::Int(exp)) if exp >= 0 => {
            let exp = u32::try_from(exp).map_err(|_| "exponent too large".to_string())?;
            base.checked_pow(exp)
                .map(Num::Int)
                .ok_or_else(|| "integer overflow".to_string())
        }
        _ => {
            let value = a.as_f64().powf(b.as_f64());
            if value.is_nan() {
                Err("math domain error".to_string())
            } else {
                Ok(Num::Float(value))
            }
        }
    }
}

fn neg(a: Num) -> Result<Num, String> {
    match a {
        Num::Int(i) => i
            .checked_neg()
            .map(Num::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        Num::Float(f) => Ok(Num::Float(-f)),
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    LParen,
    RParen,
    Comma,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                let mut is_float = false;
                while let Some(&c) = chars.peek() {
                    match c {
                        '0'..='9' => literal.push(c),
                        '.' if !is_float => {
                            is_float = true;
                            literal.push(c);
                        }
                        _ => break,
                    }
                    chars.next();
                }
                if is_float {
                    let value: f64 = literal
                        .parse()
                        .map_err(|_| format!("invalid number '{}'", literal))?;
                    tokens.push(Token::Float(value));
                } else {
                    let value: i64 = literal
                        .parse()
                        .map_err(|_| format!("invalid number '{}'", literal))?;
                    tokens.push(Token::Int(value));
                }
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::StarStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    Ok(tokens)
}

// ============================================================================
// Parser / evaluator
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(format!("expected {:?}, found {:?}", token, t)),
            None => Err(format!("expected {:?}, found end of expression", token)),
        }
    }

    fn expr(&mut self) -> Result<Num, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    value = add(value, self.term()?)?;
                }
                Some(Token::Minus) => {
                    self.next();
                    value = sub(value, self.term()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Num, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    value = mul(value, self.unary()?)?;
                }
                Some(Token::Slash) => {
                    self.next();
                    value = div(value, self.unary()?)?;
                }
                Some(Token::Percent) => {
                    self.next();
                    value = rem(value, self.unary()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<Num, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.next();
                neg(self.unary()?)
            }
            Some(Token::Plus) => {
                self.next();
                self.unary()
            }
            _ => self.power(),
        }
    }

    // Right-associative, and the right operand may carry a sign: 2 ** -3
    fn power(&mut self) -> Result<Num, String> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::StarStar) {
            self.next();
            let exp = self.unary()?;
            pow(base, exp)
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<Num, String> {
        match self.next() {
            Some(Token::Int(i)) => Ok(Num::Int(i)),
            Some(Token::Float(f)) => Ok(Num::Float(f)),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.next();
                    let args = self.call_args()?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(t) => Err(format!("unexpected {:?}", t)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Num>, String> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.next();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(t) => return Err(format!("expected ',' or ')', found {:?}", t)),
                None => return Err("expected ')', found end of expression".to_string()),
            }
        }
    }
}

fn constant(name: &str) -> Result<Num, String> {
    match name {
        "pi" => Ok(Num::Float(std::f64::consts::PI)),
        "e" => Ok(Num::Float(std::f64::consts::E)),
        _ => Err(format!("unknown identifier '{}'", name)),
    }
}

fn arity(name: &str, args: &[Num], expected: usize) -> Result<(), String> {
    if args.len() != expected {
        Err(format!(
            "{}() takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        ))
    } else {
        Ok(())
    }
}

fn apply_function(name: &str, args: &[Num]) -> Result<Num, String> {
    match name {
        "abs" => {
            arity(name, args, 1)?;
            match args[0] {
                Num::Int(i) => i
                    .checked_abs()
                    .map(Num::Int)
                    .ok_or_else(|| "integer overflow".to_string()),
                Num::Float(f) => Ok(Num::Float(f.abs())),
            }
        }
        "round" => {
            arity(name, args, 1)?;
            match args[0] {
                Num::Int(i) => Ok(Num::Int(i)),
                Num::Float(f) => {
                    let rounded = f.round();
                    if rounded.abs() > i64::MAX as f64 {
                        Err("integer overflow".to_string())
                    } else {
                        Ok(Num::Int(rounded as i64))
                    }
                }
            }
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(format!("{}() expected at least 1 argument", name));
            }
            let pick_max = name == "max";
            let mut best = args[0];
            for &arg in &args[1..] {
                let better = if pick_max {
                    arg.as_f64() > best.as_f64()
                } else {
                    arg.as_f64() < best.as_f64()
                };
                if better {
                    best = arg;
                }
            }
            Ok(best)
        }
        "sum" => {
            let mut total = Num::Int(0);
            for &arg in args {
                total = add(total, arg)?;
            }
            Ok(total)
        }
        "pow" => {
            arity(name, args, 2)?;
            pow(args[0], args[1])
        }
        "sqrt" => {
            arity(name, args, 1)?;
            let value = args[0].as_f64();
            if value < 0.0 {
                Err("math domain error".to_string())
            } else {
                Ok(Num::Float(value.sqrt()))
            }
        }
        "sin" => {
            arity(name, args, 1)?;
            Ok(Num::Float(args[0].as_f64().sin()))
        }
        "cos" => {
            arity(name, args, 1)?;
            Ok(Num::Float(args[0].as_f64().cos()))
        }
        "tan" => {
            arity(name, args, 1)?;
            Ok(Num::Float(args[0].as_f64().tan()))
        }
        _ => Err(format!("unknown identifier '{}'", name)),
    }
}

/// Evaluate an expression against the whitelisted language
fn evaluate(expression: &str) -> Result<Num, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(t) = parser.peek() {
        return Err(format!("unexpected {:?} after expression", t));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn calc(expression: &str) -> ToolResult {
        CalculatorTool
            .execute(&json!({ "expression": expression }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_integer_arithmetic_stays_integral() {
        assert_eq!(calc("2 + 2").await.output, "4");
        assert_eq!(calc("15 * 23").await.output, "345");
        assert_eq!(calc("10 - 3 * 2").await.output, "4");
        assert_eq!(calc("2 ** 10").await.output, "1024");
        assert_eq!(calc("-7 % 3").await.output, "2");
    }

    #[tokio::test]
    async fn test_floats_keep_a_trailing_zero() {
        assert_eq!(calc("sqrt(16)").await.output, "4.0");
        assert_eq!(calc("10 / 4").await.output, "2.5");
        assert_eq!(calc("8 / 2").await.output, "4.0");
        assert_eq!(calc("1.5 + 1.5").await.output, "3.0");
    }

    #[tokio::test]
    async fn test_functions_and_constants() {
        assert_eq!(calc("abs(-5)").await.output, "5");
        assert_eq!(calc("min(3, 1, 2)").await.output, "1");
        assert_eq!(calc("max(3, 1, 2)").await.output, "3");
        assert_eq!(calc("sum(1, 2, 3)").await.output, "6");
        assert_eq!(calc("pow(2, 8)").await.output, "256");
        assert_eq!(calc("round(2.6)").await.output, "3");
        assert_eq!(calc("cos(0)").await.output, "1.0");

        let result = calc("pi").await;
        assert!(result.output.starts_with("3.14159"));
    }

    #[tokio::test]
    async fn test_precedence_and_grouping() {
        assert_eq!(calc("(10 - 3) * 2").await.output, "14");
        assert_eq!(calc("2 ** 3 ** 2").await.output, "512");
        assert_eq!(calc("-2 ** 2").await.output, "-4");
        assert_eq!(calc("2 ** -1").await.output, "0.5");
    }

    #[tokio::test]
    async fn test_injection_attempts_are_rejected() {
        let result = calc("__import__('os')").await;
        assert!(result.is_error);
        assert!(result.output.starts_with("Error calculating expression:"));

        let result = calc("__import__(1)").await;
        assert!(result.is_error);
        assert!(result.output.contains("unknown identifier '__import__'"));

        let result = calc("system(1)").await;
        assert!(result.is_error);
        assert!(result.output.contains("unknown identifier 'system'"));
    }

    #[tokio::test]
    async fn test_malformed_expressions_are_errors() {
        assert!(calc("").await.is_error);
        assert!(calc("2 +").await.is_error);
        assert!(calc("(1 + 2").await.is_error);
        assert!(calc("1 / 0").await.is_error);
        assert!(calc("sqrt(-1)").await.is_error);
        assert!(calc("sqrt(1, 2)").await.is_error);
        assert!(calc("2 2").await.is_error);
    }
}
