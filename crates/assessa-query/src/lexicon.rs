//! Fixed vocabularies for query understanding.
//!
//! Each table is ordered, and lookups walk it front to back, so the same
//! query always produces the same signals and the same expansion text.

use assessa_core::Category;

/// A synonym table entry: detecting any term selects the whole set.
#[derive(Debug, Clone, Copy)]
pub struct SynonymEntry {
    /// Entry key, used for logging.
    pub key: &'static str,
    /// Terms that trigger the entry; also its full expansion set.
    pub terms: &'static [&'static str],
}

/// Skill, role and level synonyms.
pub const SYNONYMS: &[SynonymEntry] = &[
    // Programming languages
    SynonymEntry {
        key: "java",
        terms: &["java", "j2ee", "j2se", "jdk", "jvm", "spring", "hibernate", "core java", "automata"],
    },
    SynonymEntry {
        key: "python",
        terms: &["python", "django", "flask", "pandas", "numpy", "data science"],
    },
    SynonymEntry {
        key: "sql",
        terms: &["sql", "database", "mysql", "postgresql", "oracle", "sql server", "ssas"],
    },
    SynonymEntry {
        key: "javascript",
        terms: &["javascript", "js", "node", "react", "angular", "vue", "frontend"],
    },
    SynonymEntry {
        key: "html",
        terms: &["html", "css", "htmlcss", "web", "frontend", "markup"],
    },
    SynonymEntry {
        key: "css",
        terms: &["css", "html", "htmlcss", "web", "frontend", "styling"],
    },
    SynonymEntry {
        key: "selenium",
        terms: &["selenium", "automation", "testing", "qa", "web automation", "test automation"],
    },
    // Office skills
    SynonymEntry {
        key: "excel",
        terms: &["excel", "spreadsheet", "ms excel", "microsoft excel", "excel 365"],
    },
    // Roles
    SynonymEntry {
        key: "data analyst",
        terms: &["data analyst", "data analysis", "analytics", "bi", "business intelligence", "tableau"],
    },
    SynonymEntry {
        key: "developer",
        terms: &["developer", "programmer", "coder", "software engineer", "engineer", "technology"],
    },
    SynonymEntry {
        key: "sales",
        terms: &["sales", "selling", "salesperson", "account manager", "entry level sales", "sales representative"],
    },
    SynonymEntry {
        key: "manager",
        terms: &["manager", "management", "supervisor", "lead", "director", "marketing manager"],
    },
    SynonymEntry {
        key: "admin",
        terms: &["admin", "administrative", "administrator", "clerical", "office", "assistant", "bank administrative"],
    },
    SynonymEntry {
        key: "leadership",
        terms: &["leadership", "leader", "executive", "coo", "ceo", "cfo", "enterprise leadership"],
    },
    SynonymEntry {
        key: "consultant",
        terms: &["consultant", "consulting", "advisory", "professional", "advisor"],
    },
    SynonymEntry {
        key: "qa",
        terms: &["qa", "quality assurance", "testing", "test", "manual testing", "automation testing"],
    },
    SynonymEntry {
        key: "marketing",
        terms: &["marketing", "digital marketing", "advertising", "digital advertising", "brand"],
    },
    // Assessment types
    SynonymEntry {
        key: "communication",
        terms: &["communication", "verbal", "written", "english", "language", "interpersonal", "business communication"],
    },
    SynonymEntry {
        key: "personality",
        terms: &["personality", "behavior", "behavioral", "traits", "opq", "opq32", "occupational personality"],
    },
    SynonymEntry {
        key: "cognitive",
        terms: &["cognitive", "reasoning", "aptitude", "ability", "intelligence", "inductive", "deductive"],
    },
    SynonymEntry {
        key: "numerical",
        terms: &["numerical", "math", "mathematics", "quantitative", "arithmetic", "calculation", "verify numerical"],
    },
    SynonymEntry {
        key: "verbal",
        terms: &["verbal", "language", "comprehension", "reading", "writing", "verify verbal"],
    },
    SynonymEntry {
        key: "inductive",
        terms: &["inductive", "inductive reasoning", "pattern recognition", "abstract reasoning"],
    },
    // Job levels
    SynonymEntry {
        key: "entry",
        terms: &["entry", "entry level", "graduate", "junior", "fresher", "new graduate"],
    },
    SynonymEntry {
        key: "senior",
        terms: &["senior", "experienced", "advanced", "professional", "expert"],
    },
];

/// A role family and the keywords that indicate it.
#[derive(Debug, Clone, Copy)]
pub struct RoleFamily {
    /// Family name; this is the token stored in the query signals.
    pub name: &'static str,
    /// Indicating keywords.
    pub keywords: &'static [&'static str],
}

/// Role families.
pub const ROLE_FAMILIES: &[RoleFamily] = &[
    RoleFamily {
        name: "developer",
        keywords: &["developer", "developers", "programmer", "coder", "engineer", "software"],
    },
    RoleFamily {
        name: "analyst",
        keywords: &["analyst", "data analyst", "business analyst", "data"],
    },
    RoleFamily {
        name: "manager",
        keywords: &["manager", "supervisor", "lead", "director", "management"],
    },
    RoleFamily {
        name: "admin",
        keywords: &["admin", "administrative", "administrator", "assistant", "clerical"],
    },
    RoleFamily {
        name: "sales",
        keywords: &["sales", "salesperson", "account manager", "selling"],
    },
    RoleFamily {
        name: "executive",
        keywords: &["executive", "coo", "ceo", "cfo", "leadership", "senior executive"],
    },
    RoleFamily {
        name: "consultant",
        keywords: &["consultant", "consulting", "advisor", "advisory"],
    },
    RoleFamily {
        name: "professional",
        keywords: &["professional", "specialist", "expert"],
    },
];

/// Role families that imply a broad battery of assessment categories.
pub const BROAD_BATTERY_ROLES: &[&str] = &["consultant", "professional"];

/// Categories implied by [`BROAD_BATTERY_ROLES`].
pub const BROAD_BATTERY_CATEGORIES: &[Category] =
    &[Category::Personality, Category::Ability, Category::Competencies];

/// Keyword heuristics for category preferences, in evaluation order.
pub const CATEGORY_CUES: &[(&[&str], Category)] = &[
    (&["personality", "behavior", "behaviour", "behavioral", "behavioural"], Category::Personality),
    (&["cognitive", "aptitude", "reasoning"], Category::Ability),
    (&["knowledge", "skill", "skills", "technical"], Category::Knowledge),
    (&["communication", "verbal", "english"], Category::Ability),
    (&["numerical", "math", "quantitative"], Category::Ability),
    (&["situational", "judgement", "judgment"], Category::Biodata),
];

/// Entry-level cues in a query.
pub const ENTRY_CUES: &[&str] = &["entry", "graduate", "junior", "fresher", "0-2", "0-3"];

/// Senior cues in a query.
pub const SENIOR_CUES: &[&str] = &["senior", "experienced", "5+", "years"];

/// Item name words that mark an entry-level assessment.
pub const ENTRY_NAME_MARKERS: &[&str] = &["entry", "junior", "level"];

/// Item name words that mark a senior assessment.
pub const SENIOR_NAME_MARKERS: &[&str] = &["senior", "advanced", "professional"];

/// Remote testing cues in a query.
pub const REMOTE_CUES: &[&str] = &["remote", "remotely", "online"];
