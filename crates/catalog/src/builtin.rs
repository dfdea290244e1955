//! Faculties of the 2024 Kobe University student handbooks.
//!
//! Offsets for `science` and `agriculture` have not been checked against the
//! printed page numbers and default to no front matter.

use crate::EntrySpec;
use std::collections::BTreeMap;
use std::path::PathBuf;

struct Faculty {
    key: &'static str,
    name: &'static str,
    file: &'static str,
    page_offset: i64,
    departments: &'static [(&'static str, &'static str)],
}

const FACULTIES: &[Faculty] = &[
    Faculty {
        key: "engineering",
        name: "工学部",
        file: "kougaku_2024.pdf",
        page_offset: 6,
        departments: &[
            ("mechanical", "機械工学科"),
            ("electrical", "電気電子工学科"),
            ("computer_science", "情報知能工学科"),
            ("applied_chemistry", "応用化学科"),
            ("civil_engineering", "市民工学科"),
            ("architecture", "建築学科"),
        ],
    },
    Faculty {
        key: "letters",
        name: "文学部",
        file: "bungaku_2024.pdf",
        page_offset: 17,
        departments: &[
            ("philosophy", "哲学・倫理学専修"),
            ("history", "歴史学専修"),
            ("literature", "文学専修"),
            ("cultural_studies", "文化学専修"),
        ],
    },
    Faculty {
        key: "science",
        name: "理学部",
        file: "rigaku_2024.pdf",
        page_offset: 1,
        departments: &[
            ("mathematics", "数学科"),
            ("physics", "物理学科"),
            ("chemistry", "化学科"),
            ("biology", "生物学科"),
            ("planetology", "惑星学科"),
        ],
    },
    Faculty {
        key: "medicine",
        name: "医学部",
        file: "hoken_2024.pdf",
        page_offset: 8,
        departments: &[
            ("nursing", "看護学専攻"),
            ("medical_technology", "検査技術科学専攻"),
            ("physical_therapy", "理学療法学専攻"),
            ("occupational_therapy", "作業療法学専攻"),
        ],
    },
    Faculty {
        key: "business_administration",
        name: "経営学部",
        file: "keiei_2024.pdf",
        page_offset: 9,
        departments: &[("business_administration", "経営学科")],
    },
    Faculty {
        key: "global_human_sciences",
        name: "国際人間科学部",
        file: "kokusainingen_2024.pdf",
        page_offset: 9,
        departments: &[
            ("global_cultures", "グローバル文化学科"),
            ("developed_community", "発達コミュニティ学科"),
            ("environment_and_sustainability", "環境共生学科"),
            ("child_education", "子ども教育学科"),
        ],
    },
    Faculty {
        key: "agriculture",
        name: "農学部",
        file: "nougaku_2024.pdf",
        page_offset: 1,
        departments: &[
            ("agro-environmental_science", "食料環境システム学科"),
            ("bioresource_science", "資源生命科学科"),
            ("agrobioscience", "生命機能科学科"),
        ],
    },
    Faculty {
        key: "maritime_sciences",
        name: "海洋政策科学部",
        file: "kaiyo_2024.pdf",
        page_offset: 9,
        departments: &[("maritime_sciences", "海洋政策科学科")],
    },
];

/// The built-in table as raw entries, with sources relative to the
/// configured source directory.
pub fn entries() -> impl Iterator<Item = (String, EntrySpec)> {
    FACULTIES.iter().map(|faculty| {
        let departments: BTreeMap<String, String> =
            faculty.departments.iter().map(|(key, name)| (key.to_string(), name.to_string())).collect();
        let spec = EntrySpec {
            name: faculty.name.to_string(),
            source: PathBuf::from(faculty.file),
            page_offset: faculty.page_offset,
            departments,
        };
        (faculty.key.to_string(), spec)
    })
}
