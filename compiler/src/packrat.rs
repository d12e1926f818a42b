//! Memoized rule application with support for directly left-recursive rules.
//!
//! A rule applied through [apply] is evaluated at most once per input
//! position. When a rule calls itself at the position it started from, the
//! inner call fails, the rule settles on whatever the other alternatives
//! produce (the seed), and the rule is then re-run from the same position,
//! each time seeing the previous answer, until the match stops growing.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

struct Entry {
    answer:         Option<Rc<dyn Any>>,
    end:            usize,
    left_recursion: bool,
    settled:        bool,
}

/// Answers keyed by `(rule, position)`. Lives as long as one parse.
#[derive(Default)]
pub struct Memo {
    entries: HashMap<(&'static str, usize), Entry>,
}

impl Memo {
    pub fn new() -> Memo {
        Memo::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What a parser has to expose for rules to be memoized.
pub trait Packrat {
    fn memo(&mut self) -> &mut Memo;
    fn position(&self) -> usize;
    fn set_position(&mut self, pos: usize);
}

fn stored<T: Clone + 'static>(answer: &Option<Rc<dyn Any>>) -> Option<T> {
    answer.as_ref().and_then(|any| any.downcast_ref::<T>()).cloned()
}

/// Applies `body` as the rule `rule` at the current position.
pub fn apply<P, T>(parser: &mut P, rule: &'static str, body: fn(&mut P) -> Option<T>) -> Option<T>
where
    P: Packrat,
    T: Clone + 'static,
{
    let start = parser.position();
    let key = (rule, start);

    if let Some(entry) = parser.memo().entries.get_mut(&key) {
        if !entry.settled {
            entry.left_recursion = true;
            return None;
        }
        let end = entry.end;
        let answer = stored::<T>(&entry.answer);
        if answer.is_some() {
            parser.set_position(end);
        }
        return answer;
    }

    parser.memo().entries.insert(key, Entry {
        answer:         None,
        end:            start,
        left_recursion: false,
        settled:        false,
    });

    let answer = body(parser);
    let end = parser.position();

    let left_recursion = match parser.memo().entries.get_mut(&key) {
        Some(entry) => {
            let seen = entry.left_recursion;
            entry.answer = answer.clone().map(|a| Rc::new(a) as Rc<dyn Any>);
            entry.end = end;
            entry.settled = true;
            entry.left_recursion = false;
            seen
        }
        None => false,
    };

    if answer.is_none() {
        parser.set_position(start);
        None
    } else if left_recursion {
        grow(parser, key, body)
    } else {
        answer
    }
}

fn grow<P, T>(parser: &mut P, key: (&'static str, usize), body: fn(&mut P) -> Option<T>) -> Option<T>
where
    P: Packrat,
    T: Clone + 'static,
{
    let (_, start) = key;
    loop {
        parser.set_position(start);
        let answer = body(parser);
        let end = parser.position();

        let entry = parser.memo().entries.get_mut(&key)?;
        if answer.is_none() || end <= entry.end {
            break;
        }
        entry.answer = answer.map(|a| Rc::new(a) as Rc<dyn Any>);
        entry.end = end;
    }

    let entry = parser.memo().entries.get(&key)?;
    let end = entry.end;
    let answer = stored::<T>(&entry.answer);
    parser.set_position(end);
    answer
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sum = Sum "+" Digit | Digit, over a string of digits and pluses.
    struct Calc {
        input: Vec<char>,
        pos:   usize,
        memo:  Memo,
        calls: usize,
    }

    impl Packrat for Calc {
        fn memo(&mut self) -> &mut Memo {
            &mut self.memo
        }

        fn position(&self) -> usize {
            self.pos
        }

        fn set_position(&mut self, pos: usize) {
            self.pos = pos;
        }
    }

    impl Calc {
        fn new(input: &str) -> Calc {
            Calc { input: input.chars().collect(), pos: 0, memo: Memo::new(), calls: 0 }
        }

        fn digit(&mut self) -> Option<i64> {
            let c = *self.input.get(self.pos)?;
            let d = c.to_digit(10)?;
            self.pos += 1;
            Some(d as i64)
        }

        fn plus(&mut self) -> Option<()> {
            if self.input.get(self.pos) == Some(&'+') {
                self.pos += 1;
                Some(())
            } else {
                None
            }
        }

        fn sum(&mut self) -> Option<i64> {
            apply(self, "Sum", Calc::sum_body)
        }

        fn sum_body(&mut self) -> Option<i64> {
            self.calls += 1;
            let start = self.pos;
            if let Some(left) = self.sum() {
                if self.plus().is_some() {
                    if let Some(right) = self.digit() {
                        return Some(left + right);
                    }
                }
            }
            self.pos = start;
            self.digit()
        }
    }

    #[test]
    fn left_recursion_grows() {
        let mut calc = Calc::new("1+2+3+4");
        assert_eq!(calc.sum(), Some(10));
        assert_eq!(calc.pos, 7);
    }

    #[test]
    fn trailing_input_is_left() {
        let mut calc = Calc::new("1+2+x");
        assert_eq!(calc.sum(), Some(3));
        assert_eq!(calc.pos, 3);
    }

    #[test]
    fn failure_without_seed() {
        let mut calc = Calc::new("+1");
        assert_eq!(calc.sum(), None);
        assert_eq!(calc.pos, 0);
    }

    #[test]
    fn answers_are_memoized() {
        let mut calc = Calc::new("1+2");
        assert_eq!(calc.sum(), Some(3));
        let calls = calc.calls;
        calc.pos = 0;
        assert_eq!(calc.sum(), Some(3));
        assert_eq!(calc.calls, calls);
        assert_eq!(calc.pos, 3);
    }
}
