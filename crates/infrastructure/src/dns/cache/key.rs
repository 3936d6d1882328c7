use cinder_dns_domain::{Question, RClass, RecordType};

/// Cache key: lowercase name without trailing dot, plus type and class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub rtype: RecordType,
    pub class: RClass,
}

impl CacheKey {
    pub fn new(name: &str, rtype: RecordType, class: RClass) -> Self {
        Self {
            name: name.trim_end_matches('.').to_ascii_lowercase(),
            rtype,
            class,
        }
    }

    pub fn for_question(question: &Question) -> Self {
        Self::new(&question.name, question.rtype, question.class)
    }
}
