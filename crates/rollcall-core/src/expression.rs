//! Filter expressions: the AND/OR mini language shared by the name, time,
//! tags, and date dimensions.
//!
//! An expression is free text joined by the literal separators `" OR "` and
//! `" AND "`. It is parsed once into a [`FilterExpr`] tree whose terms are then
//! converted to the dimension's term type (substring, clock window, tag,
//! date window) and evaluated against a slice of records.
//!
//! # Precedence
//!
//! The grammar is not standard boolean precedence. Parsing follows these
//! rules, in order:
//!
//! 1. Split the text on `" OR "`; the pieces form a union (concatenation,
//!    duplicates kept).
//! 2. If the text does not contain the substring `"AND"`, that union is the
//!    whole expression.
//! 3. Otherwise split the text on `" AND "`. Without any `" OR "` the pieces
//!    intersect the input. With `" OR "` present, the union from step 1 is
//!    computed first and then narrowed by every `" AND "` piece in turn.
//!
//! Pieces are taken verbatim, so in a mixed expression such as
//! `"git OR python AND intro"` the union terms are `git` and `python AND intro`,
//! and the narrowing terms are `git OR python` and `intro`.
//!
//! # Example
//!
//! ```
//! use rollcall_core::FilterExpr;
//!
//! let expr = FilterExpr::parse("git OR python");
//! let titles = ["intro to git", "advanced python", "matlab"];
//! let rows: Vec<&&str> = titles.iter().collect();
//!
//! let matched = expr.evaluate(&rows, &|title: &&str, term: &String| title.contains(term.as_str()));
//! assert_eq!(matched.len(), 2);
//! ```

/// Literal separator for union terms.
pub const OR_SEPARATOR: &str = " OR ";

/// Literal separator for narrowing terms.
pub const AND_SEPARATOR: &str = " AND ";

/// Substring whose presence switches on the narrowing pass.
const AND_MARKER: &str = "AND";

/// Parsed filter expression over terms of type `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr<T> {
    /// Rows matching a single term.
    Term(T),
    /// Concatenation of each child's matches against the same input.
    Or(Vec<FilterExpr<T>>),
    /// Each child narrows the output of the previous one, starting from the input.
    And(Vec<FilterExpr<T>>),
}

impl FilterExpr<String> {
    /// Parse expression text into a tree of raw text terms.
    pub fn parse(expression: &str) -> Self {
        let mut union: Vec<FilterExpr<String>> = expression
            .split(OR_SEPARATOR)
            .map(|term| FilterExpr::Term(term.to_string()))
            .collect();
        let has_or = union.len() > 1;

        let union = if has_or {
            FilterExpr::Or(union)
        } else {
            union.remove(0)
        };

        if !expression.contains(AND_MARKER) {
            return union;
        }

        let mut narrowing: Vec<FilterExpr<String>> = expression
            .split(AND_SEPARATOR)
            .map(|term| FilterExpr::Term(term.to_string()))
            .collect();

        if has_or {
            let mut children = Vec::with_capacity(narrowing.len() + 1);
            children.push(union);
            children.append(&mut narrowing);
            FilterExpr::And(children)
        } else if narrowing.len() == 1 {
            narrowing.remove(0)
        } else {
            FilterExpr::And(narrowing)
        }
    }
}

impl<T> FilterExpr<T> {
    /// Convert every term, failing on the first term that does not convert.
    pub fn try_map<U, E, F>(&self, mut convert: F) -> Result<FilterExpr<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        self.try_map_ref(&mut convert)
    }

    fn try_map_ref<U, E, F>(&self, convert: &mut F) -> Result<FilterExpr<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        Ok(match self {
            FilterExpr::Term(term) => FilterExpr::Term(convert(term)?),
            FilterExpr::Or(children) => FilterExpr::Or(
                children
                    .iter()
                    .map(|c| c.try_map_ref(convert))
                    .collect::<Result<_, _>>()?,
            ),
            FilterExpr::And(children) => FilterExpr::And(
                children
                    .iter()
                    .map(|c| c.try_map_ref(convert))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Convert every term with an infallible conversion.
    pub fn map<U, F>(&self, mut convert: F) -> FilterExpr<U>
    where
        F: FnMut(&T) -> U,
    {
        match self.try_map(|term| Ok::<U, std::convert::Infallible>(convert(term))) {
            Ok(mapped) => mapped,
            Err(never) => match never {},
        }
    }

    /// All terms in the tree, left to right.
    pub fn terms(&self) -> Vec<&T> {
        match self {
            FilterExpr::Term(term) => vec![term],
            FilterExpr::Or(children) | FilterExpr::And(children) => {
                children.iter().flat_map(|c| c.terms()).collect()
            }
        }
    }

    /// Evaluate against `rows`, returning references into the same records.
    ///
    /// Never reorders the input within a term's matches; unions may repeat a
    /// record once per matching term.
    pub fn evaluate<'a, R, F>(&self, rows: &[&'a R], predicate: &F) -> Vec<&'a R>
    where
        R: ?Sized,
        F: Fn(&R, &T) -> bool,
    {
        match self {
            FilterExpr::Term(term) => rows
                .iter()
                .copied()
                .filter(|row| predicate(row, term))
                .collect(),
            FilterExpr::Or(children) => children
                .iter()
                .flat_map(|child| child.evaluate(rows, predicate))
                .collect(),
            FilterExpr::And(children) => children
                .iter()
                .fold(rows.to_vec(), |working, child| {
                    child.evaluate(&working, predicate)
                }),
        }
    }
}

/// Parse `expression` and evaluate it with a predicate over raw term text.
pub fn evaluate<'a, R, F>(rows: &[&'a R], expression: &str, predicate: F) -> Vec<&'a R>
where
    R: ?Sized,
    F: Fn(&R, &str) -> bool,
{
    FilterExpr::parse(expression).evaluate(rows, &|row: &R, term: &String| {
        predicate(row, term.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLES: &[&str] = &[
        "Intro to Git",
        "Advanced Python",
        "Python and Git",
        "Intro to Python",
    ];

    fn contains(title: &str, term: &str) -> bool {
        title.to_lowercase().contains(&term.to_lowercase())
    }

    fn run(expression: &str) -> Vec<&'static str> {
        evaluate(TITLES, expression, contains)
    }

    #[test]
    fn test_parse_single_term() {
        assert_eq!(
            FilterExpr::parse("python"),
            FilterExpr::Term("python".to_string())
        );
    }

    #[test]
    fn test_parse_pure_or() {
        assert_eq!(
            FilterExpr::parse("git OR python"),
            FilterExpr::Or(vec![
                FilterExpr::Term("git".to_string()),
                FilterExpr::Term("python".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_pure_and() {
        assert_eq!(
            FilterExpr::parse("git AND python"),
            FilterExpr::And(vec![
                FilterExpr::Term("git".to_string()),
                FilterExpr::Term("python".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_mixed_keeps_verbatim_pieces() {
        assert_eq!(
            FilterExpr::parse("git OR python AND intro"),
            FilterExpr::And(vec![
                FilterExpr::Or(vec![
                    FilterExpr::Term("git".to_string()),
                    FilterExpr::Term("python AND intro".to_string()),
                ]),
                FilterExpr::Term("git OR python".to_string()),
                FilterExpr::Term("intro".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_and_marker_without_separator() {
        // "AND" inside a word switches on the narrowing pass but yields one piece
        assert_eq!(
            FilterExpr::parse("ANDROID"),
            FilterExpr::Term("ANDROID".to_string())
        );
        assert_eq!(
            FilterExpr::parse("git OR ANDROID"),
            FilterExpr::And(vec![
                FilterExpr::Or(vec![
                    FilterExpr::Term("git".to_string()),
                    FilterExpr::Term("ANDROID".to_string()),
                ]),
                FilterExpr::Term("git OR ANDROID".to_string()),
            ])
        );
    }

    #[test]
    fn test_pure_or_concatenates_with_duplicates() {
        let result = run("git OR python");
        assert_eq!(
            result,
            vec![
                "Intro to Git",
                "Python and Git",
                "Advanced Python",
                "Python and Git",
                "Intro to Python",
            ]
        );
    }

    #[test]
    fn test_pure_and_intersects() {
        assert_eq!(run("git AND python"), vec!["Python and Git"]);
        assert_eq!(run("intro AND python"), vec!["Intro to Python"]);
    }

    #[test]
    fn test_mixed_narrows_union_by_verbatim_and_pieces() {
        // union("intro", "git AND python") then narrow by "intro OR git" and "python":
        // no title contains the literal text "intro or git"
        assert!(run("intro OR git AND python").is_empty());
    }

    #[test]
    fn test_mixed_narrowed_by_literal_or_piece() {
        // Or terms: "Python", "Git AND Intro"; And terms: "Python OR Git", "Intro".
        // Narrowing by the literal "python or git" keeps nothing.
        assert!(run("Python OR Git AND Intro").is_empty());
    }

    #[test]
    fn test_or_with_and_marker_narrows_by_whole_text() {
        // union of "git" and "ANDROID", then narrowed by "git OR ANDROID" verbatim
        assert!(run("git OR ANDROID").is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let none: Vec<&&str> = Vec::new();
        let result = FilterExpr::parse("git OR python").evaluate(&none, &|t: &&str, term: &String| {
            t.contains(term.as_str())
        });
        assert!(result.is_empty());
    }

    #[test]
    fn test_try_map_converts_every_term() {
        let expr = FilterExpr::parse("1 OR 2 AND 3");
        let parsed = expr.try_map(|t| t.trim().parse::<i32>());
        // the verbatim piece "2 AND 3" does not parse
        assert!(parsed.is_err());

        let expr = FilterExpr::parse("1 AND 2");
        let parsed = expr.try_map(|t| t.trim().parse::<i32>()).unwrap();
        assert_eq!(
            parsed,
            FilterExpr::And(vec![FilterExpr::Term(1), FilterExpr::Term(2)])
        );
    }

    #[test]
    fn test_terms_in_order() {
        let expr = FilterExpr::parse("a OR b AND c");
        let terms: Vec<&str> = expr.terms().into_iter().map(String::as_str).collect();
        assert_eq!(terms, vec!["a", "b AND c", "a OR b", "c"]);
    }
}
