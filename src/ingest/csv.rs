//! Alternate CSV task-table ingestion — spec §6.
//!
//! Whitespace-, tab- or comma-separated columns `name bcet wcet period
//! deadline [priority]`. A header row is detected (and skipped) if the
//! first non-empty row contains both "Task" and "WCET" case-insensitively.
//! Rows whose wcet/period/deadline do not parse are skipped and logged; the
//! resulting tasks become a single EDF root component on a single
//! performance-factor-1 core.

use crate::model::{Component, ComponentId, Core, CoreId, RootBinding, SchedulingAlgorithm, SystemModel, Task, TaskId, TaskKind};
use crate::time::Duration;

const CORE_ID: &str = "csv";
const ROOT_ID: &str = "core-csv-root";

/// Parse a CSV task table per spec §6. Never fails: unparseable rows are
/// skipped and logged rather than aborting ingestion, since the resulting
/// task set is always well-formed enough to hand to the synthesizer (which
/// performs the real validation).
pub fn parse(text: &str) -> SystemModel {
    let mut tasks = Vec::new();
    let mut header_checked = false;

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let normalized = line.replace(',', " ").replace('\t', " ");
        let fields: Vec<&str> = normalized.split_whitespace().collect();

        if !header_checked {
            header_checked = true;
            let looks_like_header = fields.iter().any(|f| f.eq_ignore_ascii_case("task"))
                && fields.iter().any(|f| f.eq_ignore_ascii_case("wcet"));
            if looks_like_header {
                continue;
            }
        }

        match parse_row(&fields, index) {
            Some(task) => tasks.push(task),
            None => log::warn!("csv ingestion: skipping unparseable row {index}: {raw_line:?}"),
        }
    }

    let core = Core { id: CoreId::from(CORE_ID), name: "csv".to_string(), performance_factor: 1.0 };
    let root = Component {
        id: ComponentId::from(ROOT_ID),
        name: "csv-root".to_string(),
        scheduling_algorithm: SchedulingAlgorithm::Edf,
        alpha: Some(1.0),
        delta: Some(Duration::ZERO),
        tasks,
        child_components: vec![],
    };

    SystemModel { cores: vec![core], roots: vec![RootBinding { core_id: CoreId::from(CORE_ID), component: root }] }
}

fn parse_row(fields: &[&str], index: usize) -> Option<Task> {
    if fields.len() < 5 {
        return None;
    }

    let name = fields[0].to_string();
    let bcet = fields[1].parse::<f64>().ok().map(Duration::new);
    let wcet = fields[2].parse::<f64>().ok()?;
    let period = fields[3].parse::<f64>().ok()?;
    let deadline = fields[4].parse::<f64>().ok()?;
    if wcet <= 0.0 || period <= 0.0 || deadline <= 0.0 {
        return None;
    }
    let priority = fields.get(5).and_then(|p| p.parse::<i64>().ok());

    Some(Task {
        id: TaskId::from(format!("csv-task-{index}")),
        name,
        kind: TaskKind::Periodic { period: Duration::new(period) },
        bcet,
        wcet: Duration::new(wcet),
        deadline: Duration::new(deadline),
        priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let text = "Task WCET Period Deadline\nt1 0 2 5 5\nt2 0 2 10 10 3\n";
        let model = parse(text);
        assert_eq!(model.roots[0].component.tasks.len(), 2);
        assert_eq!(model.roots[0].component.tasks[1].priority, Some(3));
    }

    #[test]
    fn skips_unparseable_rows() {
        let text = "t1 0 not-a-number 5 5\nt2 0 2 10 10\n";
        let model = parse(text);
        assert_eq!(model.roots[0].component.tasks.len(), 1);
        assert_eq!(model.roots[0].component.tasks[0].name, "t2");
    }

    #[test]
    fn accepts_comma_and_tab_separated_rows() {
        let text = "t1,0,2,5,5\nt2\t0\t2\t10\t10\n";
        let model = parse(text);
        assert_eq!(model.roots[0].component.tasks.len(), 2);
    }
}
