/// Errors raised by the workspace builder API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("a person named \"{0}\" already exists")]
    DuplicatePerson(String),

    #[error("a software system named \"{0}\" already exists")]
    DuplicateSoftwareSystem(String),

    #[error("a container named \"{0}\" already exists within \"{1}\"")]
    DuplicateContainer(String, String),

    #[error("a component named \"{0}\" already exists within \"{1}\"")]
    DuplicateComponent(String, String),

    #[error("a view with the key \"{0}\" already exists")]
    DuplicateViewKey(String),

    /// The referenced element handle does not belong to this model.
    #[error("unknown element handle")]
    UnknownElement,

    /// The referenced relationship handle does not belong to this model.
    #[error("unknown relationship handle")]
    UnknownRelationship,

    #[error("the element \"{0}\" cannot be instantiated in a deployment node")]
    NotInstantiable(String),
}
