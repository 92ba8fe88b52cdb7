use crate::model::{NodeIndex, TaxTree};
use crate::parser::{ByteParser, ParsingError, ParsingErrorType};
use tracing::debug;

/// Newick label delimiters: parentheses, comma, colon, semicolon, comment start
const NEWICK_LABEL_DELIMITERS: &[u8] = b"(),:;[";

/// Recursive-descent parser for (multifurcating) Newick trees.
///
/// # Configuration
/// * `with_strict_terminator(bool)` - Whether a missing `;` at the end of the
///   input is an error (default) or tolerated.
///
/// # Example
/// ```
/// use taxwick::newick::NewickParser;
/// use taxwick::parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("(A:1,B:2,(C:1,D:1)0.9:0.5);");
/// let tree = NewickParser::new().parse(&mut byte_parser).unwrap();
/// assert_eq!(tree.num_leaves(), 4);
/// assert_eq!(tree.root().children().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct NewickParser {
    strict_terminator: bool,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickParser {
    /// Creates a new `NewickParser` requiring a `;` after each tree.
    pub fn new() -> Self {
        Self {
            strict_terminator: true,
        }
    }

    /// Sets whether a missing `;` at the very end of the input is an error.
    pub fn with_strict_terminator(mut self, strict: bool) -> Self {
        self.strict_terminator = strict;
        self
    }

    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// # Returns
    /// * `Ok(TaxTree)` - The parsed tree
    /// * `Err(ParsingError)` - If the Newick format is invalid
    pub fn parse(&self, parser: &mut ByteParser) -> Result<TaxTree, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            return Err(ParsingError::from_parser(ParsingErrorType::EmptyInput, parser));
        }

        let mut tree = TaxTree::new();
        let root = self.parse_node(parser, &mut tree)?;
        tree.set_root(root);

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') && (self.strict_terminator || !parser.is_eof()) {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        debug!("Parsed tree with {} leaves", tree.num_leaves());
        Ok(tree)
    }

    /// Parses all trees until EOF.
    ///
    /// # Errors
    /// Fails on the first malformed tree, or if the input holds no tree at all.
    pub fn parse_all(&self, mut parser: ByteParser) -> Result<Vec<TaxTree>, ParsingError> {
        let mut trees = Vec::new();
        loop {
            parser.skip_comment_and_whitespace()?;
            if parser.is_eof() {
                break;
            }
            trees.push(self.parse(&mut parser)?);
        }

        if trees.is_empty() {
            return Err(ParsingError::from_parser(ParsingErrorType::EmptyInput, &parser));
        }
        Ok(trees)
    }

    /// Parses a node (either internal node or leaf) and returns its index:
    /// - Skips leading comments and whitespace
    /// - Dispatches to `parse_internal_node` if it starts with `(`, otherwise `parse_leaf`
    fn parse_node(&self, parser: &mut ByteParser, tree: &mut TaxTree) -> Result<NodeIndex, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if parser.peek_is(b'(') {
            self.parse_internal_node(parser, tree)
        } else {
            self.parse_leaf(parser, tree)
        }
    }

    /// Parses `(child, child, ...)[name|support][:branch_length]`.
    fn parse_internal_node(&self, parser: &mut ByteParser, tree: &mut TaxTree) -> Result<NodeIndex, ParsingError> {
        let children = self.parse_children(parser, tree)?;

        let token = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        let numeric = token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
        let (name, support) = match token.parse::<f64>() {
            Ok(value) if numeric => (String::new(), Some(value)),
            _ => (token, None),
        };
        let branch_length = self.parse_branch_length(parser)?;

        let index = tree.add_node(name, branch_length);
        tree[index].support = support;
        for child in children {
            tree.attach_child(index, child);
        }
        Ok(index)
    }

    /// Parses the child list `(node, node, ...)`, expecting the parser at `(`.
    fn parse_children(&self, parser: &mut ByteParser, tree: &mut TaxTree) -> Result<Vec<NodeIndex>, ParsingError> {
        if !parser.consume_if(b'(') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected '(' before children but found {:?}", parser.peek().map(|b| b as char)),
            ));
        }

        let mut children = vec![self.parse_node(parser, tree)?];
        loop {
            parser.skip_comment_and_whitespace()?;
            match parser.next_byte() {
                Some(b',') => children.push(self.parse_node(parser, tree)?),
                Some(b')') => break,
                Some(other) => {
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        format!("Expected ',' or ')' after child but found {:?}", other as char),
                    ));
                }
                None => return Err(ParsingError::unexpected_eof(parser)),
            }
        }

        if children.len() < 2 {
            return Err(ParsingError::invalid_newick_string(
                parser,
                "Internal node with a single child".to_string(),
            ));
        }
        Ok(children)
    }

    /// Parses `label[:branch_length]`.
    fn parse_leaf(&self, parser: &mut ByteParser, tree: &mut TaxTree) -> Result<NodeIndex, ParsingError> {
        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if label.is_empty() {
            return Err(match parser.peek() {
                None => ParsingError::unexpected_eof(parser),
                Some(b) => ParsingError::invalid_newick_string(
                    parser,
                    format!("Expected leaf label but found {:?}", b as char),
                ),
            });
        }
        let branch_length = self.parse_branch_length(parser)?;
        Ok(tree.add_node(label, branch_length))
    }

    /// Parses optional branch length `[:number]`:
    /// - Skips comments/whitespace before and after `:`
    /// - Supports scientific notation (e.g., `1.5e-10`)
    fn parse_branch_length(&self, parser: &mut ByteParser) -> Result<Option<f64>, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(None);
        }
        parser.skip_comment_and_whitespace()?;

        let token = parser.take_number_token();
        let value: f64 = token.parse().map_err(|_| {
            ParsingError::invalid_newick_string(parser, format!("Invalid branch length: {:?}", token))
        })?;
        Ok(Some(value))
    }
}
