use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::Tool;

#[derive(Debug, Deserialize)]
struct CalculatorInput {
    expression: String,
}

/// Arithmetic expression evaluator.
///
/// Supports `+ - * / % **`, parentheses, unary minus, scientific
/// notation, and the `sqrt`/`abs` functions. `^` is rejected with a hint
/// to use `**`. Evaluation failures come back as error text for the loop
/// to reason about.
pub struct CalculatorTool;

#[async_trait::async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Use ** for powers (never ^), full \
         numbers without thousand separators, and a period as the decimal \
         separator. Reuse observed results exactly in follow-up calculations."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {"type": "string"}
            },
            "required": ["expression"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: CalculatorInput = serde_json::from_value(args).map_err(|e| e.to_string())?;
        let value = evaluate(&input.expression)?;
        Ok(format_number(value))
    }
}

/// Evaluate an arithmetic expression to a number.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!(
            "Error evaluating expression: unexpected trailing input near '{}'",
            parser.describe_current()
        ));
    }
    Ok(value)
}

/// Full-precision formatting: integers without separators or exponent,
/// everything else with Rust's shortest round-trip float form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '^' => {
                return Err(
                    "Error evaluating expression: '^' is not supported, use '**' for powers"
                        .to_string(),
                );
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
                tokens.push(Token::Slash);
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
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: 2.0485e+006
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| {
                    format!("Error evaluating expression: invalid number '{literal}'")
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(format!(
                    "Error evaluating expression: unexpected character '{other}'"
                ));
            }
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

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(token) => format!("{token:?}"),
            None => "end of input".to_string(),
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    value /= self.unary()?;
                }
                Some(Token::Percent) => {
                    self.advance();
                    value %= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // Power binds tighter than unary minus on its left (-2**2 == -4)
    // and accepts a signed exponent on its right (2**-1 == 0.5).
    fn unary(&mut self) -> Result<f64, String> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Power) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                if self.advance() != Some(Token::RParen) {
                    return Err("Error evaluating expression: missing ')'".to_string());
                }
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.advance() != Some(Token::LParen) {
                    return Err(format!(
                        "Error evaluating expression: expected '(' after '{name}'"
                    ));
                }
                let argument = self.expr()?;
                if self.advance() != Some(Token::RParen) {
                    return Err("Error evaluating expression: missing ')'".to_string());
                }
                match name.as_str() {
                    "sqrt" => Ok(argument.sqrt()),
                    "abs" => Ok(argument.abs()),
                    other => Err(format!(
                        "Error evaluating expression: unknown function '{other}'"
                    )),
                }
            }
            other => Err(format!(
                "Error evaluating expression: unexpected token {other:?}"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn power_uses_double_star() {
        assert_eq!(evaluate("2**3").unwrap(), 8.0);
        assert_eq!(evaluate("2**-1").unwrap(), 0.5);
        assert_eq!(evaluate("-2**2").unwrap(), -4.0);
    }

    #[test]
    fn caret_is_rejected_with_hint() {
        let err = evaluate("2^3").unwrap_err();
        assert!(err.contains("**"));
    }

    #[test]
    fn functions_and_scientific_notation() {
        assert_eq!(evaluate("sqrt(16)").unwrap(), 4.0);
        assert_eq!(evaluate("abs(-3)").unwrap(), 3.0);
        assert_eq!(evaluate("2.0485e+003 * 2").unwrap(), 4097.0);
    }

    #[test]
    fn malformed_expressions_error_instead_of_panicking() {
        assert!(evaluate("").is_err());
        assert!(evaluate("1 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("foo(1)").is_err());
        assert!(evaluate("1 2").is_err());
    }

    #[test]
    fn integers_format_without_exponent() {
        assert_eq!(format_number(5000.0), "5000");
        assert_eq!(format_number(2828427.1247461904_f64.floor()), "2828427");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[tokio::test]
    async fn tool_returns_error_text_not_failure() {
        let result = CalculatorTool
            .execute(json!({"expression": "2^8"}))
            .await;
        // Schema-level failure only for malformed args; evaluation
        // problems surface through Err(String) for the loop to observe.
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("use '**'"));
    }

    #[tokio::test]
    async fn tool_evaluates_expression() {
        let result = CalculatorTool
            .execute(json!({"expression": "sqrt(2.0485e+006) * 2000"}))
            .await
            .unwrap();
        let value: f64 = result.parse().unwrap();
        assert!((value - 2_862_516.375).abs() / value < 1e-3);
    }
}
