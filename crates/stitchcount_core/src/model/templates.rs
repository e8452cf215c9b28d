//! Built-in example dataset used on first run or when storage is unreadable.

use super::project::{
    CounterOptions, Project, ProjectData, ProjectOptions, Section, SectionCounters, StoreDocument,
    TimerOptions,
};
use std::collections::BTreeMap;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

struct SectionSeed {
    id: &'static str,
    name: &'static str,
    notes: &'static [&'static str],
    counters: [u64; 4],
}

struct ProjectSeed {
    id: &'static str,
    name: &'static str,
    color: &'static str,
    age_days: i64,
    counters_shown: [bool; 4],
    timer: TimerOptions,
    sections: &'static [SectionSeed],
}

const EXAMPLES: &[ProjectSeed] = &[
    ProjectSeed {
        id: "baby-blanket-2024",
        name: "Baby Blanket",
        color: "#FFB6C1",
        age_days: 2,
        counters_shown: [true, true, true, false],
        timer: TimerOptions {
            remind_turn_on: true,
            auto_turn_off: false,
            remind_turn_on_delay: 30,
            auto_turn_off_delay: 0,
        },
        sections: &[
            SectionSeed {
                id: "border",
                name: "Border",
                notes: &["Use single crochet", "Keep tension loose"],
                counters: [240, 8, 0, 180],
            },
            SectionSeed {
                id: "main-pattern",
                name: "Main Pattern",
                notes: &["Repeat chevron pattern", "Count carefully on row 1"],
                counters: [1440, 32, 16, 720],
            },
        ],
    },
    ProjectSeed {
        id: "winter-scarf",
        name: "Winter Scarf",
        color: "#4682B4",
        age_days: 5,
        counters_shown: [true, true, false, true],
        timer: TimerOptions {
            remind_turn_on: false,
            auto_turn_off: true,
            remind_turn_on_delay: 0,
            auto_turn_off_delay: 60,
        },
        sections: &[
            SectionSeed {
                id: "ribbing",
                name: "Ribbing",
                notes: &["K2, P2 pattern", "Cast on with long-tail method"],
                counters: [96, 6, 0, 45],
            },
            SectionSeed {
                id: "body",
                name: "Body",
                notes: &["Stockinette stitch", "Check gauge every 20 rows"],
                counters: [2400, 150, 0, 900],
            },
            SectionSeed {
                id: "fringe",
                name: "Fringe",
                notes: &["Cut 8-inch strands", "Attach every 4th stitch"],
                counters: [48, 0, 24, 60],
            },
        ],
    },
    ProjectSeed {
        id: "dishcloth-set",
        name: "Kitchen Dishcloth Set",
        color: "#98FB98",
        age_days: 1,
        counters_shown: [false, true, true, false],
        timer: TimerOptions {
            remind_turn_on: true,
            auto_turn_off: true,
            remind_turn_on_delay: 15,
            auto_turn_off_delay: 45,
        },
        sections: &[
            SectionSeed {
                id: "dishcloth-1",
                name: "Dishcloth #1",
                notes: &["Seed stitch pattern", "Cotton yarn only"],
                counters: [900, 30, 0, 120],
            },
            SectionSeed {
                id: "dishcloth-2",
                name: "Dishcloth #2",
                notes: &["Diagonal pattern", "Same size as #1"],
                counters: [465, 30, 15, 90],
            },
        ],
    },
    ProjectSeed {
        id: "lace-shawl",
        name: "Evening Lace Shawl",
        color: "#DDA0DD",
        age_days: 10,
        counters_shown: [true, true, true, true],
        timer: TimerOptions {
            remind_turn_on: true,
            auto_turn_off: false,
            remind_turn_on_delay: 20,
            auto_turn_off_delay: 0,
        },
        sections: &[
            SectionSeed {
                id: "center-panel",
                name: "Center Panel",
                notes: &[
                    "Follow chart carefully",
                    "Use stitch markers",
                    "Block heavily when finished",
                ],
                counters: [2800, 140, 35, 1200],
            },
            SectionSeed {
                id: "border",
                name: "Lace Border",
                notes: &["Pick up stitches evenly", "Work border chart 3 times"],
                counters: [720, 24, 3, 360],
            },
        ],
    },
];

/// Builds the example document. Nothing is selected, matching a first launch.
///
/// `last_modified` values are spread over the past days relative to `now_ms`.
pub fn example_document(now_ms: i64) -> StoreDocument {
    let projects = EXAMPLES
        .iter()
        .map(|seed| (seed.id.to_string(), seed_project(seed, now_ms)))
        .collect();

    StoreDocument {
        projects,
        selected_project_id: String::new(),
    }
}

fn seed_project(seed: &ProjectSeed, now_ms: i64) -> Project {
    let [stitches, rows, repeats, time] = seed.counters_shown;
    let sections: BTreeMap<_, _> = seed
        .sections
        .iter()
        .map(|section| {
            let [s, r, rep, t] = section.counters;
            (
                section.id.to_string(),
                Section {
                    name: section.name.to_string(),
                    notes: section.notes.join("\n"),
                    data: SectionCounters {
                        stitches: s,
                        rows: r,
                        repeats: rep,
                        time: t,
                    },
                },
            )
        })
        .collect();

    Project {
        options: ProjectOptions {
            counter_options: CounterOptions {
                stitches,
                rows,
                repeats,
                time,
            },
            timer_options: seed.timer,
        },
        data: ProjectData { sections },
        name: seed.name.to_string(),
        color: seed.color.to_string(),
        last_modified: now_ms - seed.age_days * DAY_MS,
        selected_section_id: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::example_document;

    #[test]
    fn example_document_has_four_projects_and_no_selection() {
        let doc = example_document(100 * 24 * 60 * 60 * 1000);
        assert_eq!(doc.projects.len(), 4);
        assert!(doc.selected_project_id.is_empty());

        let scarf = &doc.projects["winter-scarf"];
        assert_eq!(scarf.data.sections.len(), 3);
        assert!(scarf.options.timer_options.auto_turn_off);
        assert_eq!(scarf.data.sections["fringe"].data.repeats, 24);
    }

    #[test]
    fn example_projects_are_dated_in_the_past() {
        let now = 50 * 24 * 60 * 60 * 1000;
        let doc = example_document(now);
        assert!(doc.projects.values().all(|p| p.last_modified < now));
    }
}
