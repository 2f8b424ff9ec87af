use crate::ast::{DeleteNode, InsertNode, SelectNode, ShowNode, TruncateNode, UpdateNode};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectNode),
    Insert(InsertNode),
    Update(UpdateNode),
    Delete(DeleteNode),
    Truncate(TruncateNode),
    /// SHOW <target>
    Show(ShowNode),
}

impl Statement {
    /// Statement name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) => "select",
            Statement::Insert(_) => "insert",
            Statement::Update(_) => "update",
            Statement::Delete(_) => "delete",
            Statement::Truncate(_) => "truncate",
            Statement::Show(_) => "show",
        }
    }
}
