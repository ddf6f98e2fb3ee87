// src/query/mod.rs

use chrono::NaiveDate;
use tracing::debug;

use crate::error::CheckerError;
use crate::table::{CaseTable, Cell};

/// Tokens in a board name that say nothing about which board it is.
const FILLER: [&str; 2] = ["&", "NHS"];

/// Answers questions about one loaded [`CaseTable`], always as of its newest
/// dated row unless a look-back is asked for.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    table: &'a CaseTable,
    delta_floor: u32,
}

impl<'a> QueryEngine<'a> {
    pub fn new(table: &'a CaseTable, delta_floor: u32) -> Self {
        Self { table, delta_floor }
    }

    pub fn table(&self) -> &'a CaseTable {
        self.table
    }

    /// Board names as they appear in the header, national total last.
    pub fn health_boards(&self) -> &'a [String] {
        self.table.regions()
    }

    /// Board names with the `NHS` prefix and `&` removed, i.e. what a user
    /// would type.
    pub fn short_names(&self) -> Vec<String> {
        self.health_boards()
            .iter()
            .map(|name| {
                name.split_whitespace()
                    .filter(|t| !FILLER.contains(t))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Raw newest cell of every board.
    pub fn newest(&self) -> Vec<&'a Cell> {
        let last = self.table.last_data_row();
        (0..self.health_boards().len())
            .filter_map(|i| self.table.cell(last, i).ok())
            .collect()
    }

    /// Newest running total of every board.
    pub fn newest_totals(&self) -> Result<Vec<i64>, CheckerError> {
        let last = self.table.last_data_row();
        (0..self.health_boards().len())
            .map(|i| self.table.count(last, i))
            .collect()
    }

    /// Running total of the national column, the last one in the header.
    pub fn scotland_total(&self) -> Result<i64, CheckerError> {
        let col = self
            .health_boards()
            .len()
            .checked_sub(1)
            .ok_or(CheckerError::EmptyTable)?;
        self.table.count(self.table.last_data_row(), col)
    }

    /// Date of the newest row, when the date cell holds one.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        let row = self.table.row(self.table.last_data_row()).ok()?;
        match &row.date {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    /// Column index of a board named exactly `name`.
    pub fn column_of(&self, name: &str) -> Result<usize, CheckerError> {
        self.health_boards()
            .iter()
            .position(|b| b == name)
            .ok_or_else(|| CheckerError::UnknownBoard(name.to_string()))
    }

    /// Running total of the board named exactly `name`.
    pub fn health_board_total(&self, name: &str) -> Result<i64, CheckerError> {
        let col = self.column_of(name)?;
        self.table.count(self.table.last_data_row(), col)
    }

    /// Largest look-back the table supports.
    pub fn max_days(&self) -> i64 {
        i64::from(self.table.last_data_row()) - i64::from(self.delta_floor)
    }

    /// Parse a user supplied day count and check it against [`Self::max_days`].
    pub fn parse_days(&self, arg: &str) -> Result<u32, CheckerError> {
        let max = self.max_days();
        let days: i64 = arg.trim().parse().map_err(|_| CheckerError::InvalidDays {
            given: arg.to_string(),
            max,
        })?;
        if days < 1 || days > max {
            return Err(CheckerError::DaysOutOfRange { given: days, max });
        }
        Ok(days as u32)
    }

    fn delta(&self, days: u32, col: usize) -> Result<i64, CheckerError> {
        let last = self.table.last_data_row();
        let earlier = last
            .checked_sub(days)
            .ok_or(CheckerError::RowOutOfTable(0))?;
        Ok(self.table.count(last, col)? - self.table.count(earlier, col)?)
    }

    /// New cases over the last `days` for every board, in header order.
    pub fn period_all(&self, days: u32) -> Result<Vec<i64>, CheckerError> {
        (0..self.health_boards().len())
            .map(|col| self.delta(days, col))
            .collect()
    }

    /// New cases over the last `days` for the board named exactly `name`.
    pub fn period_for(&self, days: u32, name: &str) -> Result<i64, CheckerError> {
        self.delta(days, self.column_of(name)?)
    }

    /// `target` is either `"all"` or an exact board name. Nothing is computed
    /// unless `days_arg` is valid.
    pub fn health_board_period(
        &self,
        days_arg: &str,
        target: &str,
    ) -> Result<Period, CheckerError> {
        let days = self.parse_days(days_arg)?;
        debug!(days, target, "period query");
        if target == "all" {
            Ok(Period::All(self.period_all(days)?))
        } else {
            Ok(Period::Single(self.period_for(days, target)?))
        }
    }

    /// Resolve a partial name such as `grampian` to `NHS Grampian`. A board
    /// matches when one of its words equals `partial`, ignoring case; the first
    /// match in header order wins.
    pub fn health_board_full_name(&self, partial: &str) -> Result<&'a str, CheckerError> {
        let wanted = partial.to_lowercase();
        self.health_boards()
            .iter()
            .find(|name| name.split_whitespace().any(|w| w.to_lowercase() == wanted))
            .map(String::as_str)
            .ok_or_else(|| self.invalid_name(partial))
    }

    /// Resolve command line tokens such as `Greater Glasgow Clyde`. The first
    /// token (other than `&` or `NHS`) found inside some board name decides.
    pub fn handle_input<S: AsRef<str>>(&self, tokens: &[S]) -> Result<&'a str, CheckerError> {
        let boards = self.health_boards();
        let token = tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !FILLER.contains(t))
            .find(|t| boards.iter().any(|b| b.contains(*t)));
        match token {
            Some(t) => self.health_board_full_name(t),
            None => Err(self.invalid_name(
                &tokens.iter().map(|t| t.as_ref()).collect::<Vec<&str>>().join(" "),
            )),
        }
    }

    fn invalid_name(&self, given: &str) -> CheckerError {
        CheckerError::InvalidName {
            given: given.to_string(),
            valid: self.short_names(),
        }
    }
}

/// Result of [`QueryEngine::health_board_period`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    All(Vec<i64>),
    Single(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DELTA_FLOOR;
    use crate::table::DataRow;

    const BOARDS: [&str; 15] = [
        "NHS Ayrshire & Arran",
        "NHS Borders",
        "NHS Dumfries & Galloway",
        "NHS Fife",
        "NHS Forth Valley",
        "NHS Grampian",
        "NHS Greater Glasgow & Clyde",
        "NHS Highland",
        "NHS Lanarkshire",
        "NHS Lothian",
        "NHS Orkney",
        "NHS Shetland",
        "NHS Tayside",
        "NHS Western Isles",
        "Scotland",
    ];

    /// 60 dated rows from sheet row 4 (last row 63); board `b` on row `r`
    /// holds `(b + 1) * r`, with `*` for the first few rows of small boards.
    fn full_table() -> CaseTable {
        let rows = (4..=63u32)
            .map(|r| DataRow {
                date: Cell::Text(format!("day {r}")),
                counts: (0..15u32)
                    .map(|b| {
                        if r < 8 && b == 10 {
                            Cell::Text("*".into())
                        } else {
                            Cell::Number(f64::from((b + 1) * r))
                        }
                    })
                    .collect(),
            })
            .chain(std::iter::once(DataRow {
                date: Cell::Empty,
                counts: vec![],
            }))
            .collect();
        CaseTable::from_parts(BOARDS.iter().map(|s| s.to_string()).collect(), 4, rows).unwrap()
    }

    #[test]
    fn test_health_boards_fixed_order() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        assert_eq!(q.health_boards().len(), 15);
        assert_eq!(q.health_boards(), BOARDS);
        assert_eq!(q.short_names()[0], "Ayrshire Arran");
        assert_eq!(q.short_names()[6], "Greater Glasgow Clyde");
        assert_eq!(q.short_names()[14], "Scotland");
    }

    #[test]
    fn test_totals() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        assert_eq!(q.newest().len(), 15);
        assert_eq!(q.scotland_total().unwrap(), 15 * 63);
        assert_eq!(q.health_board_total("NHS Fife").unwrap(), 4 * 63);
        assert_eq!(q.newest_totals().unwrap()[5], 6 * 63);
        assert!(matches!(
            q.health_board_total("Fife"),
            Err(CheckerError::UnknownBoard(_))
        ));
    }

    #[test]
    fn test_days_bounds() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        let last = i64::from(t.last_data_row());
        assert_eq!(q.max_days(), last - 39);

        assert!(matches!(q.parse_days("0"), Err(CheckerError::DaysOutOfRange { .. })));
        assert!(matches!(
            q.parse_days(&(last - 38).to_string()),
            Err(CheckerError::DaysOutOfRange { .. })
        ));
        assert!(matches!(q.parse_days("seven"), Err(CheckerError::InvalidDays { .. })));
        assert_eq!(q.parse_days("1").unwrap(), 1);
        assert_eq!(q.parse_days(&(last - 39).to_string()).unwrap(), 24);
    }

    #[test]
    fn test_period_matches_cell_difference() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        let last = t.last_data_row();
        for days in 1..=q.max_days() as u32 {
            let all = q.period_all(days).unwrap();
            assert_eq!(all.len(), q.health_boards().len());
            for (i, board) in BOARDS.iter().enumerate() {
                let expected = t.count(last, i).unwrap() - t.count(last - days, i).unwrap();
                assert_eq!(q.period_for(days, board).unwrap(), expected);
                assert_eq!(all[i], expected);
            }
        }
    }

    #[test]
    fn test_health_board_period_dispatch() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        assert_eq!(
            q.health_board_period("3", "NHS Borders").unwrap(),
            Period::Single(2 * 3)
        );
        match q.health_board_period("1", "all").unwrap() {
            Period::All(v) => assert_eq!(v, (1..=15).collect::<Vec<i64>>()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(q.health_board_period("0", "all").is_err());
    }

    #[test]
    fn test_full_name_resolution() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        assert_eq!(q.health_board_full_name("Grampian").unwrap(), "NHS Grampian");
        assert_eq!(q.health_board_full_name("grampian").unwrap(), "NHS Grampian");
        assert_eq!(q.health_board_full_name("Scotland").unwrap(), "Scotland");
        // Whole words only.
        assert!(q.health_board_full_name("Gramp").is_err());

        match q.health_board_full_name("Nonexistent").unwrap_err() {
            CheckerError::InvalidName { given, valid } => {
                assert_eq!(given, "Nonexistent");
                assert_eq!(valid.len(), 15);
                assert!(valid.contains(&"Western Isles".to_string()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_handle_input() {
        let t = full_table();
        let q = QueryEngine::new(&t, DELTA_FLOOR);
        assert_eq!(
            q.handle_input(&["Greater", "Glasgow", "Clyde"]).unwrap(),
            "NHS Greater Glasgow & Clyde"
        );
        assert_eq!(q.handle_input(&["NHS", "&", "Arran"]).unwrap(), "NHS Ayrshire & Arran");
        assert_eq!(q.handle_input(&["Western", "Isles"]).unwrap(), "NHS Western Isles");
        // Substring of a board name, but not a whole word of one.
        assert!(matches!(
            q.handle_input(&["Glas"]),
            Err(CheckerError::InvalidName { .. })
        ));
        assert!(matches!(
            q.handle_input(&["NHS"]),
            Err(CheckerError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_suppressed_cells_inside_floor_are_rejected() {
        let t = full_table();
        // A floor of 4 lets the look-back reach row 4, where NHS Orkney is `*`.
        let q = QueryEngine::new(&t, 4);
        assert_eq!(q.max_days(), 59);
        assert!(matches!(
            q.period_for(q.max_days() as u32, "NHS Orkney"),
            Err(CheckerError::NotANumber { .. })
        ));
        assert!(q.period_for(q.max_days() as u32, "NHS Fife").is_ok());
    }
}
