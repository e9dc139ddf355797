/// a span is simply a location in the script, from the beginning (lo) to end
/// (hi) represented as (line, col). You'll find them in tokens and sprinkled
/// all around AST nodes, and runtime errors carry the span of the expression
/// that failed
///
/// lines and columns are 1-based. the default span (0:0) means the location
/// is internal, for example an error raised by the host or a builtin
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Span {
    pub lo: (usize, usize),
    pub hi: (usize, usize),
}
impl Span {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn at(line: usize, col: usize) -> Self {
        Span { lo: (line, col), hi: (line, col) }
    }
    /// This is set as in "a set of berries" not "set x to 2". taking a list
    /// of spans, find the span spanning ALL of them, so for example one
    /// being just on line 1 and one on line 3, the set will go from line
    /// 1 to 3
    pub fn set(mut spans: Vec<Span>) -> Span {
        let first = match spans.pop() {
            Some(first) => first,
            None => return Span::new(),
        };
        let mut lo = first.lo;
        let mut hi = first.hi;
        for span in spans {
            // if lower, go lower
            if span.lo.0 < lo.0 || (span.lo.0 == lo.0 && span.lo.1 < lo.1) {
                lo = span.lo;
            }
            // if higher go higher
            if span.hi.0 > hi.0 || (span.hi.0 == hi.0 && span.hi.1 > hi.1) {
                hi = span.hi;
            }
        }
        Span { lo, hi }
    }
    /// shorthand for the set of two spans
    pub fn to(self, other: Span) -> Span {
        Span::set(vec![self, other])
    }
}
impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if *self == Span::new() {
            write!(f, "internal")
        } else {
            write!(f, "{}:{}", self.lo.0, self.lo.1)
        }
    }
}
