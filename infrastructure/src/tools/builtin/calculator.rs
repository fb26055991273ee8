//! `calculator` tool: safe arithmetic expression evaluator.
//!
//! Expressions are tokenized and evaluated by a small recursive-descent
//! parser; nothing is ever handed to a shell or interpreter.
//!
//! # Grammar
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '//' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := atom (('**' | '^') unary)?
//! atom    := number | constant | function '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! Exponentiation is right-associative and binds tighter than unary minus,
//! so `-2**2` is `-4`. `%` and `//` follow floored division.

use async_trait::async_trait;
use deepseek_domain::{
    CachePolicy, ParamType, Tool, ToolError, ToolInvocation, ToolParameter, ToolSpec,
};
use serde_json::{Value, json};
use std::f64::consts::{E, PI, TAU};
use std::time::Duration;
use thiserror::Error;

/// Canonical tool name for the calculator.
pub const CALCULATOR: &str = "calculator";

pub const MAX_EXPRESSION_LENGTH: usize = 500;
const MAX_EXPONENT: f64 = 1000.0;
const MAX_POWER_BASE: f64 = 1e10;
const MAX_FACTORIAL: f64 = 170.0;

/// Evaluation failure, reported to the model verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct CalcError(String);

impl CalcError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type CalcResult<T> = Result<T, CalcError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: 1e5, 2.5E-3
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::new(format!("Invalid number '{text}'")))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Power);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '^' => {
                tokens.push(Token::Power);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => return Err(CalcError::new(format!("Invalid character '{other}'"))),
        }
    }

    Ok(tokens)
}

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
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> CalcResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(CalcError::new(format!("Expected {what}")))
        }
    }

    fn expr(&mut self) -> CalcResult<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                value += self.term()?;
            } else if self.eat(&Token::Minus) {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> CalcResult<f64> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                value *= self.unary()?;
            } else if self.eat(&Token::Slash) {
                let rhs = nonzero(self.unary()?)?;
                value /= rhs;
            } else if self.eat(&Token::DoubleSlash) {
                let rhs = nonzero(self.unary()?)?;
                value = (value / rhs).floor();
            } else if self.eat(&Token::Percent) {
                let rhs = nonzero(self.unary()?)?;
                value -= rhs * (value / rhs).floor();
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> CalcResult<f64> {
        if self.eat(&Token::Minus) {
            Ok(-self.unary()?)
        } else if self.eat(&Token::Plus) {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> CalcResult<f64> {
        let base = self.atom()?;
        if self.eat(&Token::Power) {
            let exponent = self.unary()?;
            return pow(base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> CalcResult<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    let mut args = vec![self.expr()?];
                    while self.eat(&Token::Comma) {
                        args.push(self.expr()?);
                    }
                    self.expect(&Token::RParen, "')' after function arguments")?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(CalcError::new(format!("Unexpected token {token:?}"))),
            None => Err(CalcError::new("Unexpected end of expression")),
        }
    }
}

fn nonzero(value: f64) -> CalcResult<f64> {
    if value == 0.0 {
        Err(CalcError::new("Division by zero"))
    } else {
        Ok(value)
    }
}

fn pow(base: f64, exponent: f64) -> CalcResult<f64> {
    if exponent.abs() > MAX_EXPONENT {
        return Err(CalcError::new("Exponent too large (max 1000)"));
    }
    if base.abs() > MAX_POWER_BASE {
        return Err(CalcError::new("Base too large for exponentiation"));
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(CalcError::new("Division by zero"));
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(CalcError::new(
            "Cannot raise a negative number to a fractional power",
        ));
    }
    Ok(base.powf(exponent))
}

fn constant(name: &str) -> CalcResult<f64> {
    match name {
        "pi" => Ok(PI),
        "e" => Ok(E),
        "tau" => Ok(TAU),
        other => Err(CalcError::new(format!("Unknown identifier '{other}'"))),
    }
}

fn apply_function(name: &str, args: &[f64]) -> CalcResult<f64> {
    let arity = |expected: &[usize]| -> CalcResult<()> {
        if expected.contains(&args.len()) {
            Ok(())
        } else {
            Err(CalcError::new(format!(
                "{name}() takes {} argument(s), got {}",
                expected
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
                args.len()
            )))
        }
    };

    match name {
        "log" => {
            arity(&[1, 2])?;
            let x = args[0];
            if x <= 0.0 {
                return Err(CalcError::new(
                    "Cannot calculate logarithm of a non-positive number",
                ));
            }
            match args.get(1) {
                None => Ok(x.ln()),
                Some(&base) if base > 0.0 && base != 1.0 => Ok(x.ln() / base.ln()),
                Some(_) => Err(CalcError::new("Invalid logarithm base")),
            }
        }
        "round" => {
            arity(&[1, 2])?;
            match args.get(1) {
                None => Ok(args[0].round_ties_even()),
                Some(&digits) => {
                    let scale = 10f64.powi(digits.clamp(-15.0, 15.0) as i32);
                    Ok((args[0] * scale).round_ties_even() / scale)
                }
            }
        }
        _ => {
            arity(&[1])?;
            unary_function(name, args[0])
        }
    }
}

fn unary_function(name: &str, x: f64) -> CalcResult<f64> {
    let value = match name {
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" | "acos" => {
            if !(-1.0..=1.0).contains(&x) {
                return Err(CalcError::new(format!("{name}() argument must be between -1 and 1")));
            }
            if name == "asin" { x.asin() } else { x.acos() }
        }
        "atan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "exp" => x.exp(),
        "log10" => {
            if x <= 0.0 {
                return Err(CalcError::new(
                    "Cannot calculate logarithm of a non-positive number",
                ));
            }
            x.log10()
        }
        "sqrt" => {
            if x < 0.0 {
                return Err(CalcError::new(
                    "Cannot calculate square root of a negative number",
                ));
            }
            x.sqrt()
        }
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "degrees" => x.to_degrees(),
        "radians" => x.to_radians(),
        "factorial" => {
            if x < 0.0 || x.fract() != 0.0 {
                return Err(CalcError::new(
                    "Factorial is only defined for non-negative integers",
                ));
            }
            if x > MAX_FACTORIAL {
                return Err(CalcError::new("Factorial argument too large (max 170)"));
            }
            (1..=x as u64).map(|n| n as f64).product()
        }
        other => return Err(CalcError::new(format!("Unknown function '{other}'"))),
    };
    Ok(value)
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> CalcResult<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::new("Empty expression"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(CalcError::new(format!("Unexpected token {token:?}")));
    }
    if !value.is_finite() {
        return Err(CalcError::new("Result is not a finite number"));
    }
    Ok(value)
}

/// Integral values as integers, very large or small ones in scientific
/// notation, everything else with up to 10 significant digits.
pub fn format_number(value: f64) -> String {
    let abs = value.abs();
    if value.fract() == 0.0 && abs < 1e15 {
        return format!("{}", value as i64);
    }
    if abs > 1e6 || (abs < 1e-6 && abs > 0.0) {
        return format!("{value:.10e}");
    }
    let int_digits = if abs >= 1.0 {
        abs.log10().floor() as usize + 1
    } else {
        0
    };
    let decimals = 10usize.saturating_sub(int_digits);
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn result_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Arithmetic and scientific calculator
pub struct CalculatorTool {
    spec: ToolSpec,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                CALCULATOR,
                "Evaluate a mathematical expression. Supports + - * / // % ** ^, parentheses, \
                 sin cos tan asin acos atan sinh cosh tanh exp log log10 sqrt abs round floor \
                 ceil degrees radians factorial and the constants pi, e, tau.",
            )
            .with_parameter(ToolParameter::required(
                "expression",
                "The expression to evaluate, e.g. '12*7' or 'sqrt(2)/2'",
                ParamType::String,
            )),
        }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let expression = call.require_str("expression").map_err(ToolError::validation)?;
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(ToolError::validation("Expression must not be empty"));
        }
        if expression.len() > MAX_EXPRESSION_LENGTH {
            return Err(ToolError::validation(format!(
                "Expression too long (max {MAX_EXPRESSION_LENGTH} characters)"
            )));
        }

        let value = evaluate(expression).map_err(|e| ToolError::execution_failed(e.to_string()))?;
        Ok(json!({
            "expression": expression,
            "result": result_value(value),
            "formatted_result": format_number(value),
        }))
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::enabled(Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> f64 {
        evaluate(expr).unwrap()
    }

    fn err(expr: &str) -> String {
        evaluate(expr).unwrap_err().to_string()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("12*7"), 84.0);
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("2 ** 3 ** 2"), 512.0);
        assert_eq!(eval("2^10"), 1024.0);
        assert_eq!(eval("-2**2"), -4.0);
        assert_eq!(eval("2**-1"), 0.5);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("--3"), 3.0);
    }

    #[test]
    fn test_floored_division_and_modulo() {
        assert_eq!(eval("7 // 2"), 3.0);
        assert_eq!(eval("-7 // 2"), -4.0);
        assert_eq!(eval("7 % 3"), 1.0);
        assert_eq!(eval("-7 % 3"), 2.0);
        assert_eq!(eval("7.5 % 2"), 1.5);
    }

    #[test]
    fn test_functions_and_constants() {
        assert!((eval("sqrt(2)/2") - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((eval("sin(pi/2)") - 1.0).abs() < 1e-12);
        assert_eq!(eval("factorial(5)"), 120.0);
        assert_eq!(eval("degrees(PI)"), 180.0);
        assert_eq!(eval("log(8, 2)"), 3.0);
        assert_eq!(eval("log10(1000)"), 3.0);
        assert_eq!(eval("round(2.5)"), 2.0);
        assert_eq!(eval("round(3.14159, 2)"), 3.14);
        assert_eq!(eval("abs(-4) + floor(2.7) + ceil(2.1)"), 9.0);
        assert!((eval("tau") - 2.0 * PI).abs() < 1e-12);
        assert_eq!(eval("1e3 + 2.5E-1"), 1000.25);
    }

    #[test]
    fn test_errors() {
        assert_eq!(err("1/0"), "Division by zero");
        assert_eq!(err("5 // 0"), "Division by zero");
        assert_eq!(err("5 % 0"), "Division by zero");
        assert_eq!(err("2 ** 1001"), "Exponent too large (max 1000)");
        assert_eq!(err("100000000000 ** 2"), "Base too large for exponentiation");
        assert_eq!(
            err("sqrt(-1)"),
            "Cannot calculate square root of a negative number"
        );
        assert!(err("log(0)").contains("non-positive"));
        assert!(err("asin(2)").contains("between -1 and 1"));
        assert!(err("factorial(2.5)").contains("non-negative integers"));
        assert!(err("import os").contains("Unknown identifier"));
        assert!(err("2 +").contains("Unexpected end"));
        assert!(err("(1 + 2").contains("Expected ')'"));
        assert!(err("1 2").contains("Unexpected token"));
        assert!(err("__import__('os')").contains("Invalid character"));
        assert!(err("foo(1)").contains("Unknown function"));
        assert!(err("sqrt(1, 2)").contains("takes 1 argument"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(84.0), "84");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_number(123.456), "123.456");
        assert_eq!(format_number(1234567.5), "1.2345675000e6");
        assert_eq!(format_number(0.0000001), "1.0000000000e-7");
    }

    #[tokio::test]
    async fn test_tool_result_shape() {
        let tool = CalculatorTool::new();
        let call = ToolInvocation::new(CALCULATOR).with_arg("expression", "12*7");
        let value = tool.invoke(&call).await.unwrap();

        assert_eq!(
            value,
            json!({"expression": "12*7", "result": 84, "formatted_result": "84"})
        );
    }

    #[tokio::test]
    async fn test_tool_errors() {
        let tool = CalculatorTool::new();

        let division = tool
            .invoke(&ToolInvocation::new(CALCULATOR).with_arg("expression", "1/0"))
            .await
            .unwrap_err();
        assert_eq!(division.code, ToolError::EXECUTION_FAILED);
        assert_eq!(division.message, "Division by zero");

        let too_long = tool
            .invoke(&ToolInvocation::new(CALCULATOR).with_arg("expression", "1+".repeat(300)))
            .await
            .unwrap_err();
        assert!(too_long.is_validation());

        let missing = tool.invoke(&ToolInvocation::new(CALCULATOR)).await.unwrap_err();
        assert!(missing.is_validation());
        assert!(tool.cache_policy().enabled);
    }
}
