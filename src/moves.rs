//! Main line extraction from the move text of a one-line record.
//!
//! The scanner only sees what follows the first `@M` marker. Comments in braces are dropped, they
//! do not nest. Variations in parentheses are dropped with depth counting, they do. What remains is
//! the main line, one lower case token per move, e.g. `"e4 e5 nf3"`.

const MOVES_MARKER: &str = "@M";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    MainLine,
    Move,
    /// Inside `depth` levels of parentheses
    Variation(usize),
    /// Inside braces, `resume` is the variation depth to return to, 0 for the main line
    Comment { resume: usize },
    /// The character after a structural `@`
    Marker,
}

impl ScanState {
    fn after_comment(resume: usize) -> ScanState {
        if resume == 0 {
            ScanState::MainLine
        } else {
            ScanState::Variation(resume)
        }
    }
}

enum Transition {
    /// The character was consumed, continue with the next one in this state
    Consume(ScanState),
    /// Process the same character again in this state
    Reprocess(ScanState),
}

struct Scanner {
    state: ScanState,
    token: String,
    tokens: String,
}

impl Scanner {
    fn new() -> Scanner {
        Scanner {
            state: ScanState::MainLine,
            token: String::new(),
            tokens: String::new(),
        }
    }

    fn feed(&mut self, c: char) {
        loop {
            match self.transition(c) {
                Transition::Consume(next) => {
                    self.state = next;
                    break;
                }
                Transition::Reprocess(next) => {
                    self.state = next;
                }
            }
        }
    }

    fn transition(&mut self, c: char) -> Transition {
        match self.state {
            ScanState::MainLine => match c {
                '{' => Transition::Consume(ScanState::Comment { resume: 0 }),
                '(' => Transition::Consume(ScanState::Variation(1)),
                '@' => Transition::Consume(ScanState::Marker),
                c if c.is_ascii_alphabetic() => {
                    self.token.push(c);
                    Transition::Consume(ScanState::Move)
                }
                _ => Transition::Consume(ScanState::MainLine),
            },
            ScanState::Move => match c {
                c if c.is_ascii_alphanumeric() || c == '-' || c == '=' => {
                    self.token.push(c);
                    Transition::Consume(ScanState::Move)
                }
                '+' | '#' => {
                    self.token.push(c);
                    self.end_token();
                    Transition::Consume(ScanState::MainLine)
                }
                _ => {
                    self.end_token();
                    Transition::Reprocess(ScanState::MainLine)
                }
            },
            ScanState::Variation(depth) => match c {
                '(' => Transition::Consume(ScanState::Variation(depth + 1)),
                ')' if depth == 1 => Transition::Consume(ScanState::MainLine),
                ')' => Transition::Consume(ScanState::Variation(depth - 1)),
                '{' => Transition::Consume(ScanState::Comment { resume: depth }),
                _ => Transition::Consume(ScanState::Variation(depth)),
            },
            ScanState::Comment { resume } => match c {
                '}' => Transition::Consume(ScanState::after_comment(resume)),
                _ => Transition::Consume(ScanState::Comment { resume }),
            },
            ScanState::Marker => Transition::Consume(ScanState::MainLine),
        }
    }

    fn end_token(&mut self) {
        if self.token.is_empty() {
            return;
        }
        if !self.tokens.is_empty() {
            self.tokens.push(' ');
        }
        self.tokens.push_str(&self.token.to_ascii_lowercase());
        self.token.clear();
    }

    fn finish(mut self) -> String {
        if self.state == ScanState::Move {
            self.end_token();
        }
        self.tokens
    }
}

/// Extract the space separated, lower case main line moves of `record`.
///
/// Returns an empty string when the record has no `@M` marker.
pub fn main_line(record: &str) -> String {
    let moves = match record.find(MOVES_MARKER) {
        Some(position) => &record[position + MOVES_MARKER.len()..],
        None => return String::new(),
    };
    let mut scanner = Scanner::new();
    for c in moves.chars() {
        scanner.feed(c);
    }
    scanner.finish()
}
