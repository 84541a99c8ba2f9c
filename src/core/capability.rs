//! Purpose: Catalogue of the capabilities a provider module may export.
//! Exports: `Capability`, `Requirement`.
//! Role: Names each exported symbol and classifies it as mandatory or optional.
//! Invariants: Symbol names match the provider's exports byte for byte.
//! Invariants: Exactly four capabilities are mandatory.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Requirement {
    Mandatory,
    Optional,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum Capability {
    Merge,
    Validate,
    PageCount,
    FreeString,
    FileSize,
    SplitByPages,
    ExtractPage,
    SplitAtPage,
    Version,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Merge,
        Capability::Validate,
        Capability::PageCount,
        Capability::FreeString,
        Capability::FileSize,
        Capability::SplitByPages,
        Capability::ExtractPage,
        Capability::SplitAtPage,
        Capability::Version,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Capability::Merge => "pdf_merge_files",
            Capability::Validate => "pdf_validate",
            Capability::PageCount => "pdf_get_page_count",
            Capability::FreeString => "free_c_string",
            Capability::FileSize => "pdf_get_file_size",
            Capability::SplitByPages => "pdf_split_by_pages",
            Capability::ExtractPage => "pdf_extract_page",
            Capability::SplitAtPage => "pdf_split_at_page",
            Capability::Version => "spdfcore_version",
        }
    }

    pub fn from_symbol(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cap| cap.symbol() == name)
    }

    pub fn requirement(self) -> Requirement {
        match self {
            Capability::Merge
            | Capability::Validate
            | Capability::PageCount
            | Capability::FreeString => Requirement::Mandatory,
            Capability::FileSize
            | Capability::SplitByPages
            | Capability::ExtractPage
            | Capability::SplitAtPage
            | Capability::Version => Requirement::Optional,
        }
    }

    pub fn is_mandatory(self) -> bool {
        self.requirement() == Requirement::Mandatory
    }

    pub fn mandatory() -> impl Iterator<Item = Capability> {
        Self::ALL.into_iter().filter(|cap| cap.is_mandatory())
    }

    pub fn optional() -> impl Iterator<Item = Capability> {
        Self::ALL.into_iter().filter(|cap| !cap.is_mandatory())
    }
}
