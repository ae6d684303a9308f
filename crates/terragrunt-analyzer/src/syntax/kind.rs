use logos::Logos;

/// Token and node kinds of the concrete syntax tree.
///
/// Tokens mostly mirror [`TokenKind`], plus the composite kinds the lexer
/// wrapper assembles itself (quoted templates and heredocs) and the pieces
/// the parser splits templates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Tokens
    Error = 0,
    Whitespace,
    Comment,
    Newline,

    Ident,
    Number,
    String,
    UnterminatedString,
    Heredoc,
    UnterminatedHeredoc,

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
    Question,
    Dot,
    Ellipsis,
    FatArrow,

    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    Exclaim,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Template pieces and keywords the parser re-tags
    TemplateQuote,
    TemplateLiteral,
    TemplateInterpolationStart,
    TemplateStrip,
    TemplateDirective,
    ForKw,
    InKw,
    IfKw,

    /// End of input. Never stored in a tree.
    Eof,

    // Nodes
    Root,
    Block,
    BlockBody,
    Attribute,
    LiteralExpr,
    TemplateExpr,
    Interpolation,
    VariableExpr,
    TraversalExpr,
    GetAttr,
    IndexOp,
    LegacyIndex,
    AttrSplat,
    FullSplat,
    FuncCallExpr,
    TupleExpr,
    ObjectExpr,
    ObjectItem,
    UnaryExpr,
    BinaryExpr,
    ConditionalExpr,
    ForExpr,
    ParenExpr,
    ErrorExpr,
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Whitespace | SyntaxKind::Comment)
    }

    /// Human-readable description used in parser error messages.
    pub fn describe(self) -> &'static str {
        match self {
            SyntaxKind::Error => "invalid character",
            SyntaxKind::Whitespace => "whitespace",
            SyntaxKind::Comment => "comment",
            SyntaxKind::Newline => "newline",
            SyntaxKind::Ident => "identifier",
            SyntaxKind::Number => "number",
            SyntaxKind::String | SyntaxKind::UnterminatedString => "string",
            SyntaxKind::Heredoc | SyntaxKind::UnterminatedHeredoc => "heredoc",
            SyntaxKind::LBrace => "`{`",
            SyntaxKind::RBrace => "`}`",
            SyntaxKind::LBracket => "`[`",
            SyntaxKind::RBracket => "`]`",
            SyntaxKind::LParen => "`(`",
            SyntaxKind::RParen => "`)`",
            SyntaxKind::Comma => "`,`",
            SyntaxKind::Colon => "`:`",
            SyntaxKind::Question => "`?`",
            SyntaxKind::Dot => "`.`",
            SyntaxKind::Ellipsis => "`...`",
            SyntaxKind::FatArrow => "`=>`",
            SyntaxKind::Equal => "`=`",
            SyntaxKind::EqualEqual => "`==`",
            SyntaxKind::NotEqual => "`!=`",
            SyntaxKind::Less => "`<`",
            SyntaxKind::LessEqual => "`<=`",
            SyntaxKind::Greater => "`>`",
            SyntaxKind::GreaterEqual => "`>=`",
            SyntaxKind::AndAnd => "`&&`",
            SyntaxKind::OrOr => "`||`",
            SyntaxKind::Exclaim => "`!`",
            SyntaxKind::Plus => "`+`",
            SyntaxKind::Minus => "`-`",
            SyntaxKind::Star => "`*`",
            SyntaxKind::Slash => "`/`",
            SyntaxKind::Percent => "`%`",
            SyntaxKind::TemplateQuote => "`\"`",
            SyntaxKind::TemplateLiteral => "template text",
            SyntaxKind::TemplateInterpolationStart => "`${`",
            SyntaxKind::TemplateStrip => "`~`",
            SyntaxKind::TemplateDirective => "template directive",
            SyntaxKind::ForKw => "`for`",
            SyntaxKind::InKw => "`in`",
            SyntaxKind::IfKw => "`if`",
            SyntaxKind::Eof => "end of file",
            _ => "syntax node",
        }
    }
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(error = ())]
pub enum TokenKind {
    #[regex(r"[ \t\r\f]+")]
    Whitespace,

    #[token("\n")]
    Newline,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    #[regex(r"//[^\n]*", allow_greedy = true)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    /// Opening quote; the lexer wrapper scans the template body by hand.
    #[token("\"")]
    Quote,

    /// `<<EOF` / `<<-EOF`; the lexer wrapper scans up to the closing marker.
    #[regex(r"<<-?[A-Za-z_][A-Za-z0-9_]*")]
    HeredocStart,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("=>")]
    FatArrow,

    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Exclaim,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
}

impl From<TokenKind> for SyntaxKind {
    fn from(token: TokenKind) -> Self {
        match token {
            TokenKind::Whitespace => SyntaxKind::Whitespace,
            TokenKind::Newline => SyntaxKind::Newline,
            TokenKind::Comment => SyntaxKind::Comment,
            TokenKind::Ident => SyntaxKind::Ident,
            TokenKind::Number => SyntaxKind::Number,
            TokenKind::Quote => SyntaxKind::UnterminatedString,
            TokenKind::HeredocStart => SyntaxKind::UnterminatedHeredoc,
            TokenKind::LBrace => SyntaxKind::LBrace,
            TokenKind::RBrace => SyntaxKind::RBrace,
            TokenKind::LBracket => SyntaxKind::LBracket,
            TokenKind::RBracket => SyntaxKind::RBracket,
            TokenKind::LParen => SyntaxKind::LParen,
            TokenKind::RParen => SyntaxKind::RParen,
            TokenKind::Comma => SyntaxKind::Comma,
            TokenKind::Colon => SyntaxKind::Colon,
            TokenKind::Question => SyntaxKind::Question,
            TokenKind::Dot => SyntaxKind::Dot,
            TokenKind::Ellipsis => SyntaxKind::Ellipsis,
            TokenKind::FatArrow => SyntaxKind::FatArrow,
            TokenKind::Equal => SyntaxKind::Equal,
            TokenKind::EqualEqual => SyntaxKind::EqualEqual,
            TokenKind::NotEqual => SyntaxKind::NotEqual,
            TokenKind::Less => SyntaxKind::Less,
            TokenKind::LessEqual => SyntaxKind::LessEqual,
            TokenKind::Greater => SyntaxKind::Greater,
            TokenKind::GreaterEqual => SyntaxKind::GreaterEqual,
            TokenKind::AndAnd => SyntaxKind::AndAnd,
            TokenKind::OrOr => SyntaxKind::OrOr,
            TokenKind::Exclaim => SyntaxKind::Exclaim,
            TokenKind::Plus => SyntaxKind::Plus,
            TokenKind::Minus => SyntaxKind::Minus,
            TokenKind::Star => SyntaxKind::Star,
            TokenKind::Slash => SyntaxKind::Slash,
            TokenKind::Percent => SyntaxKind::Percent,
        }
    }
}
