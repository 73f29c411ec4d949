use crate::size_limit::SizeLimit;

/// Represents some rules to be applied on the stream and field's content size
/// to prevent DoS attacks.
///
/// It's recommended to add some rules on field (specially text field) size to
/// prevent an attacker from sending a huge parameter that is collected in
/// memory.
///
/// # Examples
///
/// ```
/// use multipart_form::{Constraints, SizeLimit};
///
/// let constraints = Constraints::new()
///     .allowed_fields(vec!["my_text_field", "my_file_field"])
///     .size_limit(
///         SizeLimit::new()
///             // Set 15mb as size limit for the whole stream body.
///             .whole_stream(15 * 1024 * 1024)
///             // Set 10mb as size limit for all fields.
///             .per_field(10 * 1024 * 1024)
///             // Set 30kb as size limit for our text field only.
///             .for_field("my_text_field", 30 * 1024),
///     );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) allowed_fields: Option<Vec<String>>,
}

impl Constraints {
    /// Creates a set of rules with default behaviour.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on field's content length.
    pub fn size_limit(mut self, size_limit: SizeLimit) -> Constraints {
        self.size_limit = size_limit;
        self
    }

    /// Specify which fields are allowed, for any unknown field
    /// `next_field` will yield an [`Error::UnknownField`](crate::Error::UnknownField)
    /// error.
    pub fn allowed_fields<N: Into<String>>(mut self, allowed_fields: Vec<N>) -> Constraints {
        let allowed_fields = allowed_fields.into_iter().map(|item| item.into()).collect();
        self.allowed_fields = Some(allowed_fields);
        self
    }

    pub(crate) fn is_it_allowed(&self, field: Option<&str>) -> bool {
        match self.allowed_fields {
            Some(ref allowed_fields) => field
                .map(|field| allowed_fields.iter().any(|item| item == field))
                .unwrap_or(false),
            None => true,
        }
    }
}
