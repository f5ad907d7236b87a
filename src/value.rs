use std::fmt;

/// The spelling used for the "no value" marker when printed.
pub const NULL_TEXT: &str = "null";
pub const TRUE_TEXT: &str = "OO";
pub const FALSE_TEXT: &str = "DILI";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    Char(char),
    String(String),
}

/// The type a variable is declared with. Fixed for the lifetime of its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Integer,
    Float,
    Char,
    Bool,
    Text,
}

impl DeclaredType {
    /// Value a declaration without an initializer starts out with.
    pub fn zero_value(self) -> Value {
        match self {
            DeclaredType::Integer => Value::Int(0),
            DeclaredType::Float => Value::Double(0.0),
            DeclaredType::Char => Value::Char(' '),
            DeclaredType::Bool => Value::Bool(false),
            DeclaredType::Text => Value::String(String::new()),
        }
    }

    /// Reads one field of a `DAWAT` line as a value of this type.
    /// Text and single-character fields are taken untouched; everything
    /// else ignores surrounding whitespace.
    pub fn parse_field(self, raw: &str) -> Option<Value> {
        let field = raw.trim();
        match self {
            DeclaredType::Text => Some(Value::String(raw.to_string())),
            DeclaredType::Integer => field.parse::<i64>().ok().map(Value::Int),
            DeclaredType::Float => field.parse::<f64>().ok().map(Value::Double),
            DeclaredType::Char => {
                // A lone character is taken as typed, so a space can be read
                let mut chars = raw.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    return Some(Value::Char(c));
                }
                let mut chars = field.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            DeclaredType::Bool => match field.trim_matches('"') {
                TRUE_TEXT => Some(Value::Bool(true)),
                FALSE_TEXT => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DeclaredType::Integer => "NUMERO",
            DeclaredType::Float => "TIPIK",
            DeclaredType::Char => "LETRA",
            DeclaredType::Bool => "TINUOD",
            DeclaredType::Text => "PULONG",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

impl Value {
    /// Only an explicit false and the "no value" marker are falsy.
    /// Zero and the empty string count as true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Double(_))
    }

    /// The declared type this value naturally belongs to, if any.
    pub fn shape(&self) -> Option<DeclaredType> {
        match self {
            Value::Nil => None,
            Value::Bool(_) => Some(DeclaredType::Bool),
            Value::Int(_) => Some(DeclaredType::Integer),
            Value::Double(_) => Some(DeclaredType::Float),
            Value::Char(_) => Some(DeclaredType::Char),
            Value::String(_) => Some(DeclaredType::Text),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.shape() {
            Some(ty) => ty.keyword(),
            None => NULL_TEXT,
        }
    }

    /// Applies the integer/floating conversion for a slot of type `target`.
    /// Every other combination is returned unchanged.
    pub fn coerce_numeric(self, target: DeclaredType) -> Value {
        match (target, self) {
            (DeclaredType::Integer, Value::Double(n)) => Value::Int(n.trunc() as i64),
            (DeclaredType::Float, Value::Int(n)) => Value::Double(n as f64),
            (_, value) => value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "{}", NULL_TEXT),
            Value::Bool(true) => write!(f, "{}", TRUE_TEXT),
            Value::Bool(false) => write!(f, "{}", FALSE_TEXT),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => {
                // Whole numbers print without their fractional ".0"
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}
