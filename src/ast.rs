use serde::Serialize;
use std::fmt;

/// Value types of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&SymbolKind::from(*self), f)
    }
}

/// What a name in the symbol table stands for. Functions and structs share
/// the namespace of variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymbolKind {
    Int,
    Float,
    String,
    Bool,
    Function,
    Struct,
}

impl SymbolKind {
    /// The value type of a variable symbol, `None` for functions and structs.
    pub fn value_type(self) -> Option<Type> {
        match self {
            SymbolKind::Int => Some(Type::Int),
            SymbolKind::Float => Some(Type::Float),
            SymbolKind::String => Some(Type::String),
            SymbolKind::Bool => Some(Type::Bool),
            SymbolKind::Function | SymbolKind::Struct => None,
        }
    }
}

impl From<Type> for SymbolKind {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => SymbolKind::Int,
            Type::Float => SymbolKind::Float,
            Type::String => SymbolKind::String,
            Type::Bool => SymbolKind::Bool,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SymbolKind::Int => "INT",
            SymbolKind::Float => "FLOAT",
            SymbolKind::String => "STRING",
            SymbolKind::Bool => "BOOL",
            SymbolKind::Function => "FUNCTION",
            SymbolKind::Struct => "STRUCT",
        };
        f.write_str(name)
    }
}

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Str(_) => Type::String,
            Value::Bool(_) => Type::Bool,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on whole floats
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Greater => ">",
            BinaryOperator::Less => "<",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub declared_type: Type,
    pub init: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElifBranch {
    pub condition: Node,
    pub block: Vec<Node>,
}

/// Typed syntax tree. Expression variants carry their resolved type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum Node {
    Literal {
        ty: Type,
        value: Value,
    },
    Identifier {
        ty: Type,
        name: String,
    },
    UnaryMinus {
        ty: Type,
        operand: Box<Node>,
    },
    BinaryOp {
        operator: BinaryOperator,
        ty: Type,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Implicit promotion of a non-constant operand.
    Convert {
        ty: Type,
        operand: Box<Node>,
    },
    Assignment {
        ty: Type,
        target: String,
        value: Box<Node>,
    },
    Declaration(Declaration),
    Print {
        expr: Box<Node>,
    },
    Read {
        variable_name: String,
    },
    If {
        condition: Box<Node>,
        then_block: Vec<Node>,
        elifs: Vec<ElifBranch>,
        else_block: Option<Vec<Node>>,
    },
    While {
        condition: Box<Node>,
        block: Vec<Node>,
    },
    DoWhile {
        block: Vec<Node>,
        condition: Box<Node>,
    },
    For {
        init: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        step: Option<Box<Node>>,
        block: Vec<Node>,
    },
    FunctionDef {
        name: String,
        params: Vec<Declaration>,
        body: Vec<Node>,
    },
    FunctionCall {
        name: String,
        args: Vec<Node>,
    },
    StructDef {
        name: String,
        body: Vec<Node>,
    },
    ArrayDecl {
        name: String,
        dimensions: Vec<i64>,
    },
    ArrayAssign {
        name: String,
        dimensions: Vec<i64>,
        value: Box<Node>,
    },
    Return {
        name: Option<String>,
    },
}

impl Node {
    /// Resolved type of an expression node; `None` for statements.
    pub fn ty(&self) -> Option<Type> {
        match self {
            Node::Literal { ty, .. }
            | Node::Identifier { ty, .. }
            | Node::UnaryMinus { ty, .. }
            | Node::BinaryOp { ty, .. }
            | Node::Convert { ty, .. }
            | Node::Assignment { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    pub fn literal(value: Value) -> Self {
        Node::Literal {
            ty: value.ty(),
            value,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Node::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Node>,
}
