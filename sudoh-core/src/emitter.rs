//! Output buffers for generated code.
//!
//! Text for the statement being parsed is staged in `pending` and only
//! committed, fully indented, once the statement (or structure header) has
//! been parsed to its end of line.

/// Destination region of a committed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Top-level statements, wrapped in the program entry point.
    Main,
    /// Routine definitions.
    Routines,
}

const INDENT: &str = "\t";

#[derive(Debug, Default)]
pub struct Emitter {
    includes: String,
    routines: String,
    main: String,
    pending: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    /// Length of the staged text, for rolling back a failed attempt.
    pub fn staged_len(&self) -> usize {
        self.pending.len()
    }

    pub fn truncate_staged(&mut self, len: usize) {
        self.pending.truncate(len);
    }

    #[cfg(test)]
    fn staged(&self) -> &str {
        &self.pending
    }

    /// Writes the staged text as one line of `region` at scope `level`.
    ///
    /// The main region gets one extra indentation unit because it sits
    /// inside the entry point's body. Negative totals indent nothing.
    pub fn commit_line(&mut self, region: Region, level: i32) {
        let offset = match region {
            Region::Main => 1,
            Region::Routines => 0,
        };
        let depth = usize::try_from(level + offset).unwrap_or(0);
        let target = match region {
            Region::Main => &mut self.main,
            Region::Routines => &mut self.routines,
        };
        for _ in 0..depth {
            target.push_str(INDENT);
        }
        target.push_str(&self.pending);
        target.push('\n');
        self.pending.clear();
    }

    /// Adds an include directive for the header of `unit`.
    pub fn include(&mut self, unit: &str) {
        self.includes.push_str(&format!("#include \"_{unit}.h\"\n"));
    }

    /// Includes, routines, then (optionally) the main region.
    pub fn final_output(&self, include_main: bool) -> String {
        let mut out = String::with_capacity(
            self.includes.len() + self.routines.len() + self.main.len() + 1,
        );
        out.push_str(&self.includes);
        out.push('\n');
        out.push_str(&self.routines);
        if include_main {
            out.push_str(&self.main);
        }
        out
    }
}
