//! Branch and customer references
//!
//! Both are managed by external CRUD screens. The engine only reads them.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub mobile: Option<String>,
}
