/// TAP (Test Anything Protocol) v14 writer for the conformance runner.
/// Results are buffered and written to stdout by [`Tap::finish`].
#[derive(Default)]
pub struct Tap {
    points: Vec<TestPoint>,
}

struct TestPoint {
    ok: bool,
    desc: String,
    diagnostics: Option<String>,
}

impl Tap {
    pub fn new() -> Self {
        Tap::default()
    }

    pub fn ok(&mut self, desc: impl Into<String>) {
        self.points.push(TestPoint {
            ok: true,
            desc: desc.into(),
            diagnostics: None,
        });
    }

    pub fn not_ok(&mut self, desc: impl Into<String>, diagnostics: impl Into<String>) {
        self.points.push(TestPoint {
            ok: false,
            desc: desc.into(),
            diagnostics: Some(diagnostics.into()),
        });
    }

    pub fn failure_count(&self) -> usize {
        self.points.iter().filter(|t| !t.ok).count()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("TAP version 14\n");
        out.push_str(&format!("1..{}\n", self.points.len()));
        for (i, point) in self.points.iter().enumerate() {
            let status = if point.ok { "ok" } else { "not ok" };
            out.push_str(&format!("{} {} - {}\n", status, i + 1, point.desc));
            if let Some(diag) = &point.diagnostics {
                for line in diag.lines() {
                    out.push_str(&format!("  # {}\n", line));
                }
            }
        }
        let failed = self.failure_count();
        out.push_str(&format!("# tests {}\n", self.points.len()));
        out.push_str(&format!("# pass  {}\n", self.points.len() - failed));
        out.push_str(&format!("# fail  {}\n", failed));
        out
    }

    pub fn finish(self) {
        print!("{}", self.render());
    }
}
