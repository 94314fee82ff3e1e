//! # Pattern parser
//! This module implements the recursive-descent grammar for the pattern language:
//!
//! ```text
//! regex      := expression EOF
//! expression := term ('|' term)*
//! term       := factor*
//! factor     := atom quantifier?
//! atom       := LITERAL | '(' expression ')' | '[' char_set ']'
//! quantifier := '*' | '+' | '?' | '{' count_spec '}'
//! count_spec := DIGITS | DIGITS ',' | DIGITS ',' DIGITS | ',' DIGITS
//! ```
//!
//! Operator precedence, tightest to loosest, is atom, quantifier, concatenation, alternation:
//! `a|bc` parses as `a | (bc)`, not `(a|b)c`. Alternation is handled iteratively here
//! (`parse_expression` scans a `term`, then appends further terms while the next character is
//! `|`) rather than by genuine left recursion, since the grammar above isn't left-recursive to
//! begin with.
//!
//! `parse_expression` takes a set of stop characters and returns as soon as the current
//! character is in that set or the pattern is exhausted. The top-level call uses an empty stop
//! set and then demands end-of-pattern; a parenthesized group recurses with `{')'}`. A `)` also
//! always stops a term even when it isn't in `stop` — it's never anybody's atom, only ever the
//! `(` handler's closing delimiter — so an unmatched one surfaces as leftover input at whichever
//! level it wasn't consumed.

use crate::ast::{Bound, Quantifier, Token};
use crate::error::{ParseError, ParseErrorKind};
use std::collections::BTreeSet;

/// Parses `pattern` into a sequence of top-level tokens. On success the entire pattern has
/// been consumed and the returned AST's invariants (non-empty brackets, non-empty `Or`
/// operands, `min <= max` on every `Repeat`) hold.
pub fn parse(pattern: &str) -> Result<Vec<Token>, ParseError> {
    let mut cursor = Cursor::new(pattern);
    let ast = parse_expression(&mut cursor, &[])?;
    match cursor.peek() {
        None => Ok(ast),
        Some(ch) => Err(cursor.error(ParseErrorKind::TrailingInput(ch))),
    }
}

/// Tracks a position within the pattern as a character index, but reports errors in terms of
/// byte offsets (matching how `str` slicing and `ParseError::snippet` work).
struct Cursor<'p> {
    pattern: &'p str,
    chars: Vec<(usize, char)>,
    idx: usize,
}

impl<'p> Cursor<'p> {
    fn new(pattern: &'p str) -> Self {
        Self {
            pattern,
            chars: pattern.char_indices().collect(),
            idx: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|&(_, c)| c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).map(|&(_, c)| c)
    }

    fn byte_pos(&self) -> usize {
        self.chars
            .get(self.idx)
            .map(|&(b, _)| b)
            .unwrap_or(self.pattern.len())
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.idx += 1;
        }
        c
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.byte_pos(), self.pattern)
    }

    fn error_at(&self, kind: ParseErrorKind, position: usize) -> ParseError {
        ParseError::new(kind, position, self.pattern)
    }
}

fn parse_expression(c: &mut Cursor, stop: &[char]) -> Result<Vec<Token>, ParseError> {
    let mut acc = parse_term(c, stop)?;
    while c.peek() == Some('|') {
        let bar_pos = c.byte_pos();
        c.advance();
        if acc.is_empty() {
            return Err(c.error_at(ParseErrorKind::EmptyAlternationOperand, bar_pos));
        }
        let right = parse_term(c, stop)?;
        if right.is_empty() {
            return Err(c.error_at(ParseErrorKind::EmptyAlternationOperand, bar_pos));
        }
        acc = vec![Token::Or(acc, right)];
    }
    Ok(acc)
}

fn parse_term(c: &mut Cursor, stop: &[char]) -> Result<Vec<Token>, ParseError> {
    let mut seq = Vec::new();
    while let Some(ch) = c.peek() {
        // ')' always ends a term, even when it isn't in `stop`: it's only ever consumed by
        // the '(' atom handler, so an unmatched one belongs to whoever called us, not to an
        // atom here. At the top level that's `parse`'s trailing-input check.
        if ch == '|' || ch == ')' || stop.contains(&ch) {
            break;
        }
        seq.push(parse_factor(c)?);
    }
    Ok(seq)
}

fn parse_factor(c: &mut Cursor) -> Result<Token, ParseError> {
    let atom = parse_atom(c)?;
    match c.peek() {
        Some('*') | Some('+') | Some('?') | Some('{') => {
            let quantifier = parse_quantifier(c)?;
            Ok(Token::Repeat(quantifier, Box::new(atom)))
        }
        _ => Ok(atom),
    }
}

fn parse_atom(c: &mut Cursor) -> Result<Token, ParseError> {
    let pos = c.byte_pos();
    match c.peek() {
        Some('(') => {
            c.advance();
            let inner = parse_expression(c, &[')'])?;
            match c.peek() {
                Some(')') => {
                    c.advance();
                    Ok(Token::Group(inner))
                }
                _ => Err(c.error_at(ParseErrorKind::UnterminatedGroup, pos)),
            }
        }
        Some('[') => {
            c.advance();
            let set = parse_bracket(c, pos)?;
            Ok(Token::Bracket(set))
        }
        Some(ch @ ('*' | '+' | '?' | '{')) => {
            c.advance();
            Err(c.error_at(ParseErrorKind::UnexpectedCharacter(ch), pos))
        }
        Some(ch) => {
            c.advance();
            Ok(Token::Literal(ch))
        }
        None => unreachable!("parse_term never calls parse_atom at end of pattern"),
    }
}

/// Scans the inside of `[...]`, expanding `X-Y` range forms and deduplicating into a set.
/// `bracket_pos` is the byte offset of the opening `[`, used to anchor error positions.
fn parse_bracket(c: &mut Cursor, bracket_pos: usize) -> Result<BTreeSet<char>, ParseError> {
    let mut set = BTreeSet::new();
    loop {
        match c.peek() {
            None => return Err(c.error_at(ParseErrorKind::UnterminatedCharClass, bracket_pos)),
            Some(']') => {
                c.advance();
                break;
            }
            Some(x) => {
                let dash = c.peek_at(1);
                let y = c.peek_at(2);
                if dash == Some('-') && matches!(y, Some(y) if y != ']') {
                    let y = y.unwrap();
                    let x_pos = c.byte_pos();
                    if (y as u32) < (x as u32) {
                        return Err(c.error_at(ParseErrorKind::InvalidRange(x, y), x_pos));
                    }
                    for code in (x as u32)..=(y as u32) {
                        if let Some(ch) = char::from_u32(code) {
                            set.insert(ch);
                        }
                    }
                    c.advance();
                    c.advance();
                    c.advance();
                } else {
                    set.insert(x);
                    c.advance();
                }
            }
        }
    }
    if set.is_empty() {
        return Err(c.error_at(ParseErrorKind::EmptyCharClass, bracket_pos));
    }
    Ok(set)
}

fn parse_quantifier(c: &mut Cursor) -> Result<Quantifier, ParseError> {
    match c.peek() {
        Some('*') => {
            c.advance();
            Ok(Quantifier::star())
        }
        Some('+') => {
            c.advance();
            Ok(Quantifier::plus())
        }
        Some('?') => {
            c.advance();
            Ok(Quantifier::optional())
        }
        Some('{') => parse_brace_quantifier(c),
        _ => unreachable!("parse_factor only calls parse_quantifier on */+/?/{{"),
    }
}

fn parse_brace_quantifier(c: &mut Cursor) -> Result<Quantifier, ParseError> {
    let brace_pos = c.byte_pos();
    c.advance(); // consume '{'

    let mut left = String::new();
    let mut right = String::new();
    let mut comma_count = 0u32;
    let mut seen_comma = false;

    loop {
        match c.peek() {
            None => return Err(c.error_at(ParseErrorKind::UnterminatedQuantifier, brace_pos)),
            Some('}') => {
                c.advance();
                break;
            }
            Some(',') => {
                comma_count += 1;
                seen_comma = true;
                c.advance();
            }
            Some(d) if d.is_ascii_digit() => {
                if seen_comma {
                    right.push(d);
                } else {
                    left.push(d);
                }
                c.advance();
            }
            Some(other) => {
                return Err(c.error_at(
                    ParseErrorKind::MalformedQuantifier(other.to_string()),
                    brace_pos,
                ));
            }
        }
    }

    if comma_count > 1 {
        return Err(c.error_at(
            ParseErrorKind::MalformedQuantifier(",".to_string()),
            brace_pos,
        ));
    }

    let parse_digits = |digits: &str| -> Result<u32, ParseError> {
        digits.parse().map_err(|_| {
            c.error_at(
                ParseErrorKind::MalformedQuantifier(digits.to_string()),
                brace_pos,
            )
        })
    };

    if !seen_comma {
        if left.is_empty() {
            return Err(c.error_at(ParseErrorKind::EmptyQuantifier, brace_pos));
        }
        let m = parse_digits(&left)?;
        return Ok(Quantifier::new(m, Bound::Finite(m)));
    }

    if left.is_empty() && right.is_empty() {
        return Err(c.error_at(ParseErrorKind::EmptyQuantifier, brace_pos));
    }

    let min = if left.is_empty() { 0 } else { parse_digits(&left)? };

    if right.is_empty() {
        return Ok(Quantifier::new(min, Bound::Infinite));
    }

    let max = parse_digits(&right)?;
    if min > max {
        return Err(c.error_at(ParseErrorKind::InvalidQuantifierRange(min, max), brace_pos));
    }
    Ok(Quantifier::new(min, Bound::Finite(max)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind::*;

    fn kind(pattern: &str) -> ParseErrorKind {
        parse(pattern).unwrap_err().kind
    }

    #[test]
    fn parses_literal_sequence() {
        assert_eq!(
            parse("abc").unwrap(),
            vec![Token::Literal('a'), Token::Literal('b'), Token::Literal('c')]
        );
    }

    #[test]
    fn parses_empty_pattern() {
        assert_eq!(parse("").unwrap(), Vec::<Token>::new());
    }

    #[test]
    fn alternation_left_associates() {
        let ast = parse("a|b|c").unwrap();
        assert_eq!(
            ast,
            vec![Token::Or(
                vec![Token::Or(vec![Token::Literal('a')], vec![Token::Literal('b')])],
                vec![Token::Literal('c')],
            )]
        );
    }

    #[test]
    fn alternation_precedes_over_concatenation() {
        // a|bc parses as a | (bc), not (a|b)c
        let ast = parse("a|bc").unwrap();
        assert_eq!(
            ast,
            vec![Token::Or(
                vec![Token::Literal('a')],
                vec![Token::Literal('b'), Token::Literal('c')],
            )]
        );
    }

    #[test]
    fn group_and_quantifier() {
        let ast = parse("(ab)+").unwrap();
        assert_eq!(
            ast,
            vec![Token::Repeat(
                Quantifier::plus(),
                Box::new(Token::Group(vec![Token::Literal('a'), Token::Literal('b')])),
            )]
        );
    }

    #[test]
    fn empty_group_matches_empty_string() {
        assert_eq!(parse("()").unwrap(), vec![Token::Group(vec![])]);
    }

    #[test]
    fn bracket_expands_ranges_and_dedupes() {
        let ast = parse("[a-ca]").unwrap();
        assert_eq!(ast, vec![Token::Bracket(BTreeSet::from(['a', 'b', 'c']))]);
    }

    #[test]
    fn bracket_leading_and_trailing_hyphen_are_literal() {
        assert_eq!(
            parse("[-a]").unwrap(),
            vec![Token::Bracket(BTreeSet::from(['-', 'a']))]
        );
        assert_eq!(
            parse("[a-]").unwrap(),
            vec![Token::Bracket(BTreeSet::from(['-', 'a']))]
        );
    }

    #[test]
    fn brace_quantifier_forms() {
        assert_eq!(
            parse("a{2}").unwrap()[0],
            Token::Repeat(Quantifier::new(2, Bound::Finite(2)), Box::new(Token::Literal('a')))
        );
        assert_eq!(
            parse("a{2,}").unwrap()[0],
            Token::Repeat(Quantifier::new(2, Bound::Infinite), Box::new(Token::Literal('a')))
        );
        assert_eq!(
            parse("a{,3}").unwrap()[0],
            Token::Repeat(Quantifier::new(0, Bound::Finite(3)), Box::new(Token::Literal('a')))
        );
        assert_eq!(
            parse("a{2,3}").unwrap()[0],
            Token::Repeat(Quantifier::new(2, Bound::Finite(3)), Box::new(Token::Literal('a')))
        );
    }

    #[test]
    fn unterminated_group() {
        assert_eq!(kind("(abc"), UnterminatedGroup);
    }

    #[test]
    fn invalid_range() {
        assert_eq!(kind("[z-a]"), InvalidRange('z', 'a'));
    }

    #[test]
    fn invalid_quantifier_range() {
        assert_eq!(kind("a{2,1}"), InvalidQuantifierRange(2, 1));
    }

    #[test]
    fn quantifier_without_atom() {
        assert_eq!(kind("a**"), UnexpectedCharacter('*'));
    }

    #[test]
    fn leading_bar_is_empty_operand() {
        assert_eq!(kind("|a"), EmptyAlternationOperand);
    }

    #[test]
    fn trailing_bar_is_empty_operand() {
        assert_eq!(kind("a|"), EmptyAlternationOperand);
    }

    #[test]
    fn group_with_empty_alternation_operand_is_illegal() {
        assert_eq!(kind("(|a)"), EmptyAlternationOperand);
        assert_eq!(kind("(a|)"), EmptyAlternationOperand);
    }

    #[test]
    fn empty_char_class_is_an_error() {
        assert_eq!(kind("[]"), EmptyCharClass);
    }

    #[test]
    fn unterminated_char_class() {
        assert_eq!(kind("[abc"), UnterminatedCharClass);
    }

    #[test]
    fn unterminated_quantifier() {
        assert_eq!(kind("a{2"), UnterminatedQuantifier);
    }

    #[test]
    fn empty_quantifier_forms() {
        assert_eq!(kind("a{}"), EmptyQuantifier);
        assert_eq!(kind("a{,}"), EmptyQuantifier);
    }

    #[test]
    fn malformed_quantifier_forms() {
        assert_eq!(kind("a{1,2,3}"), MalformedQuantifier(",".to_string()));
        assert_eq!(kind("a{x}"), MalformedQuantifier("x".to_string()));
    }

    #[test]
    fn trailing_input_after_complete_expression() {
        // ')' belongs to whichever '(' opened it; an unmatched one at the top level is
        // leftover input, not an atom-expected error.
        assert_eq!(kind("a)"), TrailingInput(')'));
        assert_eq!(kind("(a)b)"), TrailingInput(')'));
    }
}
