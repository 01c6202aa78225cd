//! Parser
//!
//! A cursor over the flat token list, producing the command tree.
//!
//! Grammar (simplified):
//!   program    ::= command*
//!   command    ::= simple | group | function | '&&' | '||' | '|'
//!   simple     ::= assignment* (argument | redirection)*
//!   assignment ::= WORD '=' argument
//!   argument   ::= primary (('^' | adjacency) argument)*
//!   primary    ::= WORD | QUOTED | variable | variable '(' args ')'
//!                | '(' args ')' | '`{' command* '}' | '='
//!
//! Two rc peculiarities shape the argument grammar. The *free caret*:
//! adjacent primaries concatenate as though `^` stood between them,
//! with explicit carets folding left and implicit adjacency recursing
//! right. And `=` in argument position is a literal word, which is what
//! lets `--flag=value` and the `>[2=1]` aliasing target survive the
//! lexer splitting them at `=`.

use crate::ast::types::{Argument, Assignment, Command, Direction, Redirection, SimpleCommand};
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::types::SyntaxError;

/// Parse a source string into a command list.
pub fn parse(source: &str) -> Result<Vec<Command>, SyntaxError> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(source, tokens).parse_program()
}

/// Token-cursor parser.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    fn current(&self) -> Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek(&self, offset: usize) -> Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at_offset(message, self.source, self.current().start)
    }

    fn skip_whitespace(&mut self) {
        while self.kind() == TokenKind::Whitespace {
            self.advance();
        }
    }

    fn at_argument_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Word
                | TokenKind::QuotedWord
                | TokenKind::Variable
                | TokenKind::VariableCount
                | TokenKind::VariableString
                | TokenKind::LParen
                | TokenKind::BacktickBrace
                | TokenKind::Equal
        )
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    fn parse_program(&mut self) -> Result<Vec<Command>, SyntaxError> {
        self.parse_commands(None)
    }

    /// The top-level loop, also used for group bodies and substitution
    /// bodies (`until` carries the closing token). A pending `|` holds
    /// the popped left side until the next command is emitted.
    fn parse_commands(&mut self, until: Option<TokenKind>) -> Result<Vec<Command>, SyntaxError> {
        let mut commands: Vec<Command> = Vec::new();
        let mut pipe_lhs: Option<Command> = None;

        macro_rules! emit {
            ($cmd:expr) => {{
                let cmd = $cmd;
                match pipe_lhs.take() {
                    Some(lhs) => commands.push(Command::Pipe {
                        lhs: Box::new(lhs),
                        rhs: Box::new(cmd),
                    }),
                    None => commands.push(cmd),
                }
            }};
        }

        loop {
            let kind = self.kind();
            if Some(kind) == until {
                self.advance();
                break;
            }
            match kind {
                TokenKind::Whitespace
                | TokenKind::Comment
                | TokenKind::Newline
                | TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Eof => {
                    if until.is_some() {
                        return Err(self.error("unexpected end of input"));
                    }
                    break;
                }
                TokenKind::Word
                | TokenKind::QuotedWord
                | TokenKind::Variable
                | TokenKind::VariableCount
                | TokenKind::VariableString
                | TokenKind::BacktickBrace => {
                    for cmd in self.parse_simple()? {
                        emit!(cmd);
                    }
                }
                TokenKind::LBrace => {
                    self.advance();
                    let body = self.parse_commands(Some(TokenKind::RBrace))?;
                    emit!(Command::Group(body));
                }
                TokenKind::Fn => {
                    let function = self.parse_function()?;
                    emit!(function);
                }
                TokenKind::AndAnd => {
                    self.advance();
                    commands.push(Command::IfZero);
                }
                TokenKind::OrOr => {
                    self.advance();
                    commands.push(Command::IfNonzero);
                }
                TokenKind::Pipe => {
                    self.advance();
                    let lhs = commands
                        .pop()
                        .ok_or_else(|| self.error("missing left side of pipe"))?;
                    pipe_lhs = Some(lhs);
                }
                other => {
                    return Err(self.error(format!("unexpected token `{}`", other.as_str())));
                }
            }
        }

        if pipe_lhs.is_some() {
            return Err(self.error("missing right side of pipe"));
        }
        Ok(commands)
    }

    /// A simple command with its assignment prefix. Trailing assignments
    /// with no command following become statement-level assignments.
    fn parse_simple(&mut self) -> Result<Vec<Command>, SyntaxError> {
        let assignments = self.parse_assignments()?;
        let mut simple = SimpleCommand {
            assignments,
            ..Default::default()
        };

        loop {
            match self.kind() {
                TokenKind::Whitespace => {
                    self.advance();
                }
                TokenKind::Less | TokenKind::Great | TokenKind::DGreat => {
                    let redirection = self.parse_redirection()?;
                    simple.redirections.push(redirection);
                }
                _ if self.at_argument_start() => {
                    let argument = self.next_argument()?;
                    simple.arguments.push(argument);
                }
                _ => break,
            }
        }

        if simple.arguments.is_empty() && simple.redirections.is_empty() {
            return Ok(simple
                .assignments
                .into_iter()
                .map(|a| Command::Assignment {
                    key: a.key,
                    value: a.value,
                })
                .collect());
        }
        Ok(vec![Command::Simple(simple)])
    }

    /// Consume `WORD '=' argument` tuples separated by whitespace. On any
    /// mismatch the cursor rewinds to the start of the failed tuple and
    /// the assignments collected so far are returned.
    fn parse_assignments(&mut self) -> Result<Vec<Assignment>, SyntaxError> {
        let mut assignments = Vec::new();
        loop {
            let save = self.pos;
            self.skip_whitespace();
            if self.kind() != TokenKind::Word || self.peek(1).kind != TokenKind::Equal {
                self.pos = save;
                break;
            }
            let key = self.text(self.current()).to_string();
            self.advance(); // word
            self.advance(); // '='
            if !self.at_argument_start() {
                self.pos = save;
                break;
            }
            let value = self.next_argument()?;
            assignments.push(Assignment { key, value });
        }
        Ok(assignments)
    }

    // =========================================================================
    // ARGUMENTS
    // =========================================================================

    /// Parse one argument, folding concatenation.
    fn next_argument(&mut self) -> Result<Argument, SyntaxError> {
        let primary = self.primary()?;
        self.fold_concats(primary)
    }

    /// The free-caret rule. Explicit carets are eaten greedily and fold
    /// left one primary at a time; implicit adjacency recurses into a
    /// full argument, leaning right. `foo^$bar^.c` therefore builds
    /// `((foo bar) .c)` while `foo$bar.c` builds `(foo (bar .c))`.
    fn fold_concats(&mut self, mut arg: Argument) -> Result<Argument, SyntaxError> {
        loop {
            if self.kind() == TokenKind::Caret {
                while self.kind() == TokenKind::Caret {
                    self.advance();
                }
                let rhs = self.primary()?;
                arg = concat(arg, rhs);
                continue;
            }
            if self.continues(&arg) {
                let rhs = self.next_argument()?;
                arg = concat(arg, rhs);
            }
            break;
        }
        Ok(arg)
    }

    /// Whether the current token implicitly continues the argument.
    /// Words and quoted words may pick up a following list; variables
    /// may not: `$xs(…)` is a subscript, consumed by `primary`.
    fn continues(&self, lhs: &Argument) -> bool {
        match self.kind() {
            TokenKind::Word
            | TokenKind::QuotedWord
            | TokenKind::Variable
            | TokenKind::VariableCount
            | TokenKind::VariableString
            | TokenKind::Equal => true,
            TokenKind::LParen => word_concats_with_list(lhs),
            _ => false,
        }
    }

    fn primary(&mut self) -> Result<Argument, SyntaxError> {
        match self.kind() {
            TokenKind::Word => {
                let token = self.advance();
                Ok(Argument::Word(self.text(token).to_string()))
            }
            TokenKind::QuotedWord => {
                let token = self.advance();
                Ok(Argument::QuotedWord(self.text(token).to_string()))
            }
            TokenKind::Equal => {
                self.advance();
                Ok(Argument::Word("=".to_string()))
            }
            TokenKind::Variable => {
                let token = self.advance();
                let name = self.text(token)[1..].to_string();
                if self.kind() == TokenKind::LParen {
                    self.advance();
                    let fields = self.parse_list_body()?;
                    return Ok(Argument::VariableSubscript {
                        key: name,
                        fields: Box::new(fields),
                    });
                }
                Ok(Argument::Variable(name))
            }
            TokenKind::VariableCount => {
                let token = self.advance();
                Ok(Argument::VariableCount(self.text(token)[2..].to_string()))
            }
            TokenKind::VariableString => {
                let token = self.advance();
                Ok(Argument::VariableString(self.text(token)[2..].to_string()))
            }
            TokenKind::LParen => {
                self.advance();
                self.parse_list_body()
            }
            TokenKind::BacktickBrace => {
                self.advance();
                let commands = self.parse_commands(Some(TokenKind::RBrace))?;
                Ok(Argument::Substitution(commands))
            }
            TokenKind::Backtick => Err(self.error("expected `{` after backtick")),
            other => Err(self.error(format!("expected argument, found `{}`", other.as_str()))),
        }
    }

    /// Arguments up to the matching `)`. Whitespace separates elements;
    /// nested lists are flattened into the containing list.
    fn parse_list_body(&mut self) -> Result<Argument, SyntaxError> {
        let mut items = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => return Err(self.error("unclosed list")),
                _ if self.at_argument_start() => {
                    match self.next_argument()? {
                        Argument::List(nested) => items.extend(nested),
                        argument => items.push(argument),
                    }
                }
                other => {
                    return Err(self.error(format!("unexpected token `{}` in list", other.as_str())));
                }
            }
        }
        Ok(Argument::List(items))
    }

    // =========================================================================
    // REDIRECTIONS & FUNCTIONS
    // =========================================================================

    /// `<file`, `>file`, `>>file`, with an optional adjacent `[n]` fd.
    /// An adjacent `[`-word without `]` is the aliasing form (`[2=1]`
    /// lexes as several tokens because `=` is not a word byte); it is
    /// passed through as the file argument for the interpreter to
    /// decode.
    fn parse_redirection(&mut self) -> Result<Redirection, SyntaxError> {
        let op = self.advance();
        let (direction, append) = match op.kind {
            TokenKind::Less => (Direction::In, false),
            TokenKind::Great => (Direction::Out, false),
            TokenKind::DGreat => (Direction::Out, true),
            _ => unreachable!("caller checked the redirection operator"),
        };
        let mut fd = Redirection::default_fd(direction);

        if self.kind() == TokenKind::Word {
            let text = self.text(self.current());
            if text.starts_with('[') {
                if let Some(close) = text.find(']') {
                    fd = text[1..close]
                        .parse::<i32>()
                        .map_err(|_| self.error("bad file descriptor in redirection"))?;
                    let rest = text[close + 1..].to_string();
                    self.advance();
                    let file = if rest.is_empty() {
                        self.skip_whitespace();
                        if !self.at_argument_start() {
                            return Err(self.error("expected redirection target"));
                        }
                        self.next_argument()?
                    } else {
                        self.fold_concats(Argument::Word(rest))?
                    };
                    return Ok(Redirection {
                        direction,
                        append,
                        fd,
                        file,
                    });
                }
                let file = self.next_argument()?;
                return Ok(Redirection {
                    direction,
                    append,
                    fd,
                    file,
                });
            }
        }

        self.skip_whitespace();
        if !self.at_argument_start() {
            return Err(self.error("expected redirection target"));
        }
        let file = self.next_argument()?;
        Ok(Redirection {
            direction,
            append,
            fd,
            file,
        })
    }

    /// `fn name { body }`. The body is the raw source slice between the
    /// braces, located by counting brace tokens (including the compound
    /// openers `<{`, `>{`, `<>{`, and `` `{ ``). It is not parsed here.
    fn parse_function(&mut self) -> Result<Command, SyntaxError> {
        self.advance(); // 'fn'
        self.skip_whitespace();
        if self.kind() != TokenKind::Word {
            return Err(self.error("expected function name"));
        }
        let name_token = self.advance();
        let name = self.text(name_token).to_string();
        self.skip_whitespace();
        if self.kind() != TokenKind::LBrace {
            return Err(self.error("expected `{` to open function body"));
        }
        let open = self.advance();

        let mut depth = 1usize;
        loop {
            let token = self.current();
            match token.kind {
                TokenKind::LBrace
                | TokenKind::LessBrace
                | TokenKind::GreatBrace
                | TokenKind::LessGreatBrace
                | TokenKind::BacktickBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        let body = self.source[open.end..token.start].to_string();
                        return Ok(Command::Function { name, body });
                    }
                }
                TokenKind::Eof => return Err(self.error("unclosed function body")),
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn concat(lhs: Argument, rhs: Argument) -> Argument {
    Argument::Concatenate {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// A list may implicitly follow a word or quoted word (cross-product),
/// but not a variable. For a concatenation the rightmost primary
/// decides.
fn word_concats_with_list(arg: &Argument) -> bool {
    match arg {
        Argument::Word(_) | Argument::QuotedWord(_) => true,
        Argument::Concatenate { rhs, .. } => word_concats_with_list(rhs),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Argument {
        Argument::Word(s.to_string())
    }

    fn var(s: &str) -> Argument {
        Argument::Variable(s.to_string())
    }

    fn cat(lhs: Argument, rhs: Argument) -> Argument {
        concat(lhs, rhs)
    }

    fn simple_args(cmd: &Command) -> &[Argument] {
        match cmd {
            Command::Simple(s) => &s.arguments,
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_command() {
        let cmds = parse("echo hello world").unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(
            simple_args(&cmds[0]),
            &[word("echo"), word("hello"), word("world")]
        );
    }

    #[test]
    fn test_statement_assignment() {
        let cmds = parse("foo=bar; echo $foo").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(
            cmds[0],
            Command::Assignment {
                key: "foo".to_string(),
                value: word("bar"),
            }
        );
        assert_eq!(simple_args(&cmds[1]), &[word("echo"), var("foo")]);
    }

    #[test]
    fn test_list_assignment() {
        let cmds = parse("xs=(a b c)").unwrap();
        assert_eq!(
            cmds[0],
            Command::Assignment {
                key: "xs".to_string(),
                value: Argument::List(vec![word("a"), word("b"), word("c")]),
            }
        );
    }

    #[test]
    fn test_local_assignment_prefix() {
        let cmds = parse("k=v cmd arg").unwrap();
        match &cmds[0] {
            Command::Simple(s) => {
                assert_eq!(s.assignments.len(), 1);
                assert_eq!(s.assignments[0].key, "k");
                assert_eq!(s.assignments[0].value, word("v"));
                assert_eq!(s.arguments, vec![word("cmd"), word("arg")]);
            }
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_never_a_word_argument() {
        // `a=b` at statement start is an assignment, not a word.
        let cmds = parse("a=b").unwrap();
        assert!(matches!(&cmds[0], Command::Assignment { key, .. } if key == "a"));
    }

    #[test]
    fn test_nested_lists_flatten() {
        let cmds = parse("echo (a (b c) d)").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[1],
            Argument::List(vec![word("a"), word("b"), word("c"), word("d")])
        );
    }

    #[test]
    fn test_free_caret_right_leaning_at_variable() {
        let cmds = parse("echo foo$bar.c").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[1],
            cat(word("foo"), cat(var("bar"), word(".c")))
        );
    }

    #[test]
    fn test_explicit_caret_left_associated() {
        let cmds = parse("echo foo^$bar^.c").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[1],
            cat(cat(word("foo"), var("bar")), word(".c"))
        );
    }

    #[test]
    fn test_simple_concatenations() {
        let cmds = parse("echo foo$bar foo^bar").unwrap();
        let args = simple_args(&cmds[0]);
        assert_eq!(args[1], cat(word("foo"), var("bar")));
        assert_eq!(args[2], cat(word("foo"), word("bar")));
    }

    #[test]
    fn test_equal_in_argument_position() {
        let cmds = parse("cmd --flag=value").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[1],
            cat(word("--flag"), cat(word("="), word("value")))
        );
    }

    #[test]
    fn test_word_concats_with_list() {
        let cmds = parse("echo pre(a b)").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[1],
            cat(word("pre"), Argument::List(vec![word("a"), word("b")]))
        );
    }

    #[test]
    fn test_variable_subscript() {
        let cmds = parse("echo $xs(2)").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[1],
            Argument::VariableSubscript {
                key: "xs".to_string(),
                fields: Box::new(Argument::List(vec![word("2")])),
            }
        );
    }

    #[test]
    fn test_subscript_requires_adjacency() {
        // With a space the parens are a separate list argument.
        let cmds = parse("echo $xs (2)").unwrap();
        let args = simple_args(&cmds[0]);
        assert_eq!(args[1], var("xs"));
        assert_eq!(args[2], Argument::List(vec![word("2")]));
    }

    #[test]
    fn test_substitution() {
        let cmds = parse("echo `{ls -l}").unwrap();
        match &simple_args(&cmds[0])[1] {
            Argument::Substitution(body) => {
                assert_eq!(simple_args(&body[0]), &[word("ls"), word("-l")]);
            }
            other => panic!("expected substitution, got {:?}", other),
        }
    }

    #[test]
    fn test_pipe() {
        let cmds = parse("a | b").unwrap();
        match &cmds[0] {
            Command::Pipe { lhs, rhs } => {
                assert_eq!(simple_args(lhs), &[word("a")]);
                assert_eq!(simple_args(rhs), &[word("b")]);
            }
            other => panic!("expected pipe, got {:?}", other),
        }
    }

    #[test]
    fn test_pipe_left_nests() {
        let cmds = parse("a | b | c").unwrap();
        match &cmds[0] {
            Command::Pipe { lhs, rhs } => {
                assert!(matches!(**lhs, Command::Pipe { .. }));
                assert_eq!(simple_args(rhs), &[word("c")]);
            }
            other => panic!("expected pipe, got {:?}", other),
        }
    }

    #[test]
    fn test_group() {
        let cmds = parse("{ a; b }").unwrap();
        match &cmds[0] {
            Command::Group(body) => {
                assert_eq!(body.len(), 2);
                assert_eq!(simple_args(&body[0]), &[word("a")]);
                assert_eq!(simple_args(&body[1]), &[word("b")]);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_short_circuit_sentinels() {
        let cmds = parse("a && b || c").unwrap();
        assert_eq!(cmds.len(), 5);
        assert!(matches!(cmds[1], Command::IfZero));
        assert!(matches!(cmds[3], Command::IfNonzero));
    }

    #[test]
    fn test_function_body_is_raw_source() {
        let cmds = parse("fn greet { echo hi $1 }").unwrap();
        assert_eq!(
            cmds[0],
            Command::Function {
                name: "greet".to_string(),
                body: " echo hi $1 ".to_string(),
            }
        );
    }

    #[test]
    fn test_function_body_counts_nested_braces() {
        let cmds = parse("fn f { { a } ; echo `{b} }").unwrap();
        match &cmds[0] {
            Command::Function { body, .. } => {
                assert_eq!(body, " { a } ; echo `{b} ");
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_redirection_out() {
        let cmds = parse("echo one > /tmp/rz_t").unwrap();
        match &cmds[0] {
            Command::Simple(s) => {
                assert_eq!(s.arguments, vec![word("echo"), word("one")]);
                assert_eq!(
                    s.redirections[0],
                    Redirection {
                        direction: Direction::Out,
                        append: false,
                        fd: 1,
                        file: word("/tmp/rz_t"),
                    }
                );
            }
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_redirection_append_and_in() {
        let cmds = parse("cmd >> log < input").unwrap();
        match &cmds[0] {
            Command::Simple(s) => {
                assert!(s.redirections[0].append);
                assert_eq!(s.redirections[0].fd, 1);
                assert_eq!(s.redirections[1].direction, Direction::In);
                assert_eq!(s.redirections[1].fd, 0);
            }
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_redirection_explicit_fd() {
        let cmds = parse("cmd >[2] err.log").unwrap();
        match &cmds[0] {
            Command::Simple(s) => {
                assert_eq!(s.redirections[0].fd, 2);
                assert_eq!(s.redirections[0].file, word("err.log"));
            }
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_redirection_fd_glued_to_target() {
        let cmds = parse("cmd >[2]err.log").unwrap();
        match &cmds[0] {
            Command::Simple(s) => {
                assert_eq!(s.redirections[0].fd, 2);
                assert_eq!(s.redirections[0].file, word("err.log"));
            }
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_redirection_alias_form_is_concatenated_target() {
        // `[2=1]` splits at `=` in the lexer, so it reaches the
        // interpreter as a concatenation resolving to "[2=1]".
        let cmds = parse("cmd >[2=1]").unwrap();
        match &cmds[0] {
            Command::Simple(s) => {
                assert_eq!(s.redirections[0].fd, 1);
                assert_eq!(
                    s.redirections[0].file,
                    cat(word("[2"), cat(word("="), word("1]")))
                );
            }
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_word_starts_command() {
        let cmds = parse("'echo' hi").unwrap();
        assert_eq!(
            simple_args(&cmds[0])[0],
            Argument::QuotedWord("'echo'".to_string())
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("~").is_err());
        assert!(parse("{ a").is_err());
        assert!(parse("| b").is_err());
        assert!(parse("a |").is_err());
        assert!(parse("echo (a").is_err());
        assert!(parse("fn f ").is_err());
        assert!(parse("cmd >").is_err());
        assert!(parse("echo ` x").is_err());
    }
}
