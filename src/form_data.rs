use std::collections::HashMap;

/// A form field without a file name, decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPart {
    name: String,
    data: String,
}

impl ParameterPart {
    /// Creates a parameter from its field name and decoded value.
    pub fn new<N: Into<String>, D: Into<String>>(name: N, data: D) -> ParameterPart {
        ParameterPart {
            name: name.into(),
            data: data.into(),
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded value.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Consumes the part, returning its value.
    pub fn into_data(self) -> String {
        self.data
    }
}

/// An uploaded file together with the sink its content was written to.
#[derive(Debug)]
pub struct FilePart<W> {
    name: String,
    file_name: String,
    content_type: Option<mime::Mime>,
    data: W,
}

impl<W> FilePart<W> {
    /// Creates a file part from its field name, file name, declared content
    /// type and the sink holding its content.
    pub fn new<N, F>(name: N, file_name: F, content_type: Option<mime::Mime>, data: W) -> FilePart<W>
    where
        N: Into<String>,
        F: Into<String>,
    {
        FilePart {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file name sent by the client, possibly empty.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The `Content-Type` the client declared for the file, if any.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    /// The sink holding the file content.
    pub fn data(&self) -> &W {
        &self.data
    }

    /// A mutable reference to the sink holding the file content.
    pub fn data_mut(&mut self) -> &mut W {
        &mut self.data
    }

    /// Consumes the part, returning its sink.
    pub fn into_data(self) -> W {
        self.data
    }
}

/// The parameters and files of a fully parsed `multipart/form-data` body.
///
/// Both are keyed by field name. When a name occurs more than once, the last
/// occurrence replaces the earlier ones in its map. A name used once for a
/// parameter and once for a file shows up in both maps.
#[derive(Debug)]
pub struct FormData<W = Vec<u8>> {
    parameters: HashMap<String, ParameterPart>,
    files: HashMap<String, FilePart<W>>,
}

impl<W> FormData<W> {
    /// Creates an empty result.
    pub fn new() -> FormData<W> {
        FormData {
            parameters: HashMap::new(),
            files: HashMap::new(),
        }
    }

    /// All parameters keyed by field name.
    pub fn parameters(&self) -> &HashMap<String, ParameterPart> {
        &self.parameters
    }

    /// All files keyed by field name.
    pub fn files(&self) -> &HashMap<String, FilePart<W>> {
        &self.files
    }

    /// The parameter named `name`, if any.
    pub fn parameter(&self, name: &str) -> Option<&ParameterPart> {
        self.parameters.get(name)
    }

    /// The file named `name`, if any.
    pub fn file(&self, name: &str) -> Option<&FilePart<W>> {
        self.files.get(name)
    }

    /// Stores `part`, returning the parameter it replaced.
    pub fn insert_parameter(&mut self, part: ParameterPart) -> Option<ParameterPart> {
        self.parameters.insert(part.name.clone(), part)
    }

    /// Stores `part`, returning the file it replaced.
    pub fn insert_file(&mut self, part: FilePart<W>) -> Option<FilePart<W>> {
        self.files.insert(part.name.clone(), part)
    }

    /// Number of distinct parameter and file entries.
    pub fn len(&self) -> usize {
        self.parameters.len() + self.files.len()
    }

    /// Returns `true` if there are neither parameters nor files.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.files.is_empty()
    }

    /// Consumes the result, returning the parameter and file maps.
    pub fn into_parts(self) -> (HashMap<String, ParameterPart>, HashMap<String, FilePart<W>>) {
        (self.parameters, self.files)
    }
}

impl<W> Default for FormData<W> {
    fn default() -> Self {
        FormData::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_parameter_wins() {
        let mut form = FormData::<Vec<u8>>::new();

        assert_eq!(form.insert_parameter(ParameterPart::new("a", "first")), None);
        assert_eq!(
            form.insert_parameter(ParameterPart::new("a", "second")),
            Some(ParameterPart::new("a", "first"))
        );

        assert_eq!(form.parameter("a").map(|p| p.data()), Some("second"));
        assert_eq!(form.len(), 1);
    }

    #[test]
    fn test_last_file_wins() {
        let mut form = FormData::new();

        form.insert_file(FilePart::new("f", "one.txt", None, b"one".to_vec()));
        let replaced = form.insert_file(FilePart::new("f", "two.txt", Some(mime::TEXT_PLAIN), b"two".to_vec()));

        assert_eq!(replaced.map(|f| f.into_data()), Some(b"one".to_vec()));

        let file = form.file("f").unwrap();
        assert_eq!(file.file_name(), "two.txt");
        assert_eq!(file.content_type(), Some(&mime::TEXT_PLAIN));
        assert_eq!(file.data(), b"two");
    }

    #[test]
    fn test_same_name_in_both_maps() {
        let mut form: FormData<Vec<u8>> = FormData::new();
        form.insert_parameter(ParameterPart::new("x", "text"));
        form.insert_file(FilePart::new("x", "x.bin", None, Vec::new()));

        assert_eq!(form.len(), 2);
        assert!(!form.is_empty());

        let (parameters, files) = form.into_parts();
        assert!(parameters.contains_key("x"));
        assert!(files.contains_key("x"));
    }
}
