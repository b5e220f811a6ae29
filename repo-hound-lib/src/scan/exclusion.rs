/// Deny-list of substrings that keep a repository out of the run.
///
/// Matching is case-insensitive plain substring containment.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    keywords: Box<[String]>,
}

impl ExclusionFilter {
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    #[must_use]
    pub fn is_excluded(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|keyword| text.contains(keyword.as_str()))
    }
}
