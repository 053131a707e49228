//! Structural matcher.
//!
//! Patterns are lowered to a Thompson NFA program and run as a Pike VM: every
//! live thread advances over the token sequence in lockstep, so a match costs
//! at most tokens times program size steps and nothing recurses per token.
//! Threads are kept in priority order (greedy quantifiers, earlier alternatives
//! first) and a thread reaching an instruction already visited at the same
//! position is dropped. The surviving derivation is the one a greedy
//! backtracking matcher would report. Each thread carries the labeled spans it
//! has closed.

use std::ops::Range;
use std::rc::Rc;

use super::pattern::{CompiledPattern, Pattern, SpanLabel, Token, TokenClass};

/// A labeled region of a successful match.
#[derive(Debug, Clone)]
pub struct LabeledSpan {
    pub label: SpanLabel,
    /// Token indices consumed by the region.
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    NoMatch,
    Matched(Vec<LabeledSpan>),
}

impl MatchOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

#[derive(Debug, Clone)]
enum Inst {
    Token(TokenClass),
    /// Fork; the first target has priority.
    Split(usize, usize),
    Jump(usize),
    /// Start of a labeled region.
    Open,
    /// End of a labeled region, by index into `Program::labels`.
    Close(usize),
    Fail,
    Match,
}

/// Instruction form of a pattern.
#[derive(Debug, Clone)]
pub struct Program {
    insts: Vec<Inst>,
    labels: Vec<SpanLabel>,
}

impl Program {
    #[must_use]
    pub fn compile(pattern: &Pattern) -> Self {
        let mut program = Self {
            insts: Vec::new(),
            labels: Vec::new(),
        };
        program.emit(pattern);
        program.insts.push(Inst::Match);
        program
    }

    fn emit(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Empty => {}
            Pattern::Token(class) => self.insts.push(Inst::Token(class.clone())),
            Pattern::Sequence(items) => {
                for item in items {
                    self.emit(item);
                }
            }
            Pattern::Choice(alternatives) => self.emit_choice(alternatives),
            Pattern::Repeat { item, min, max } => self.emit_repeat(item, *min, *max),
            Pattern::Labeled { label, inner } => {
                let index = self.labels.len();
                self.labels.push(label.clone());
                self.insts.push(Inst::Open);
                self.emit(inner);
                self.insts.push(Inst::Close(index));
            }
        }
    }

    fn emit_choice(&mut self, alternatives: &[Pattern]) {
        let Some((last, rest)) = alternatives.split_last() else {
            self.insts.push(Inst::Fail);
            return;
        };
        let mut exits = Vec::with_capacity(rest.len());
        for alt in rest {
            let split = self.placeholder();
            self.emit(alt);
            exits.push(self.placeholder());
            let next = self.insts.len();
            self.insts[split] = Inst::Split(split + 1, next);
        }
        self.emit(last);
        let end = self.insts.len();
        for exit in exits {
            self.insts[exit] = Inst::Jump(end);
        }
    }

    fn emit_repeat(&mut self, item: &Pattern, min: usize, max: Option<usize>) {
        for _ in 0..min {
            self.emit(item);
        }
        if let Some(max) = max {
            // (item (item ...)?)? with every fork leaving to the same end.
            let splits: Vec<usize> = (min..max)
                .map(|_| {
                    let split = self.placeholder();
                    self.emit(item);
                    split
                })
                .collect();
            let end = self.insts.len();
            for split in splits {
                self.insts[split] = Inst::Split(split + 1, end);
            }
        } else {
            let split = self.placeholder();
            self.emit(item);
            self.insts.push(Inst::Jump(split));
            let end = self.insts.len();
            self.insts[split] = Inst::Split(split + 1, end);
        }
    }

    fn placeholder(&mut self) -> usize {
        self.insts.push(Inst::Fail);
        self.insts.len() - 1
    }

    fn labeled_spans(&self, thread: &Thread) -> Vec<LabeledSpan> {
        thread
            .spans
            .to_vec()
            .into_iter()
            .filter_map(|(index, span)| {
                self.labels.get(index).map(|label| LabeledSpan {
                    label: label.clone(),
                    span,
                })
            })
            .collect()
    }
}

/// Match `tokens` against `pattern`; the whole sequence must be consumed.
#[must_use]
pub fn run(pattern: &CompiledPattern, tokens: &[Token]) -> MatchOutcome {
    let program = pattern.program();
    let mut vm = Vm::new(program);
    let mut current = Vec::new();
    let mut next = Vec::new();

    vm.next_generation();
    vm.add_thread(&mut current, 0, Thread::default(), 0);
    for (pos, token) in tokens.iter().enumerate() {
        if current.is_empty() {
            return MatchOutcome::NoMatch;
        }
        vm.next_generation();
        for (pc, thread) in current.drain(..) {
            if let Some(Inst::Token(class)) = program.insts.get(pc)
                && class.accepts(token)
            {
                vm.add_thread(&mut next, pc + 1, thread, pos + 1);
            }
        }
        std::mem::swap(&mut current, &mut next);
    }

    current
        .iter()
        .find(|(pc, _)| matches!(program.insts.get(*pc), Some(Inst::Match)))
        .map_or(MatchOutcome::NoMatch, |(_, thread)| {
            MatchOutcome::Matched(program.labeled_spans(thread))
        })
}

/// Threads parked on a `Token` or `Match` instruction, in priority order.
type ThreadList = Vec<(usize, Thread)>;

struct Vm<'p> {
    program: &'p Program,
    /// Generation in which each instruction was last visited.
    visited: Vec<usize>,
    generation: usize,
    stack: Vec<(usize, Thread)>,
}

impl<'p> Vm<'p> {
    fn new(program: &'p Program) -> Self {
        Self {
            program,
            visited: vec![0; program.insts.len()],
            generation: 0,
            stack: Vec::new(),
        }
    }

    fn next_generation(&mut self) {
        self.generation += 1;
    }

    /// Follow every epsilon edge from `pc` at `pos`, depth first in priority
    /// order, parking the threads that reach a consuming instruction.
    fn add_thread(&mut self, list: &mut ThreadList, pc: usize, thread: Thread, pos: usize) {
        let program = self.program;
        self.stack.push((pc, thread));
        while let Some((pc, thread)) = self.stack.pop() {
            let Some(seen) = self.visited.get_mut(pc) else {
                continue;
            };
            if *seen == self.generation {
                continue;
            }
            *seen = self.generation;

            match &program.insts[pc] {
                Inst::Jump(to) => self.stack.push((*to, thread)),
                Inst::Split(first, second) => {
                    self.stack.push((*second, thread.clone()));
                    self.stack.push((*first, thread));
                }
                Inst::Open => self.stack.push((
                    pc + 1,
                    Thread {
                        open: thread.open.push(pos),
                        spans: thread.spans.clone(),
                    },
                )),
                Inst::Close(label) => {
                    if let Some((start, open)) = thread.open.pop() {
                        let spans = thread.spans.push((*label, start..pos));
                        self.stack.push((pc + 1, Thread { open, spans }));
                    }
                }
                Inst::Token(_) | Inst::Match => list.push((pc, thread)),
                Inst::Fail => {}
            }
        }
    }
}

/// Per-thread match state; shares structure with the threads it forked from.
#[derive(Clone, Default)]
struct Thread {
    /// Start positions of the labeled regions currently open.
    open: Trail<usize>,
    /// Closed regions, most recent first.
    spans: Trail<(usize, Range<usize>)>,
}

/// Persistent stack: pushing never copies, forks share their common tail.
struct Trail<T>(Option<Rc<Link<T>>>);

struct Link<T> {
    head: T,
    tail: Trail<T>,
}

impl<T> Default for Trail<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Clone for Trail<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone> Trail<T> {
    fn push(&self, head: T) -> Self {
        Self(Some(Rc::new(Link {
            head,
            tail: self.clone(),
        })))
    }

    fn pop(&self) -> Option<(T, Self)> {
        self.0
            .as_ref()
            .map(|link| (link.head.clone(), link.tail.clone()))
    }

    /// Elements oldest first.
    fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::new();
        let mut cursor = self.0.as_ref();
        while let Some(link) = cursor {
            out.push(link.head.clone());
            cursor = link.tail.0.as_ref();
        }
        out.reverse();
        out
    }
}

impl<T> Drop for Trail<T> {
    // Unlink iteratively; a long chain would otherwise drop recursively.
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(rc) = next {
            match Rc::try_unwrap(rc) {
                Ok(mut link) => next = link.tail.0.take(),
                Err(_) => break,
            }
        }
    }
}
