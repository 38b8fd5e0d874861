//! Tracks nested `#if`/`#ifdef`/`#ifndef` ... `#elif` ... `#else` ... `#endif` chains and
//! whether the directive driver is currently emitting tokens or skipping them.

#[derive(Debug, Clone, Copy)]
struct ConditionalFrame {
    /// Whether the currently-selected branch of this chain is active.
    branch_active: bool,
    /// Whether some branch in this chain has already been taken; once true, further
    /// `#elif`/`#else` branches in the same chain are skipped even if their condition holds.
    any_branch_taken: bool,
    saw_else: bool,
    /// Whether the enclosing scope was active when this `#if` was entered. A nested `#if`
    /// inside a skipped region must stay skipped regardless of its own condition.
    parent_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether the directive driver should currently be emitting tokens.
    pub fn is_active(&self) -> bool {
        self.frames.iter().all(|f| f.branch_active)
    }

    pub fn push_if(&mut self, condition: bool) {
        let parent_active = self.is_active();
        let branch_active = parent_active && condition;
        self.frames.push(ConditionalFrame {
            branch_active,
            any_branch_taken: branch_active,
            saw_else: false,
            parent_active,
        });
    }

    pub fn elif(&mut self, condition: bool) -> Result<(), &'static str> {
        let frame = self
            .frames
            .last_mut()
            .ok_or("#elif with no matching #if")?;
        if frame.saw_else {
            return Err("#elif found after #else");
        }
        if frame.any_branch_taken {
            frame.branch_active = false;
        } else {
            frame.branch_active = frame.parent_active && condition;
            frame.any_branch_taken = frame.branch_active;
        }
        Ok(())
    }

    pub fn else_branch(&mut self) -> Result<(), &'static str> {
        let frame = self
            .frames
            .last_mut()
            .ok_or("#else with no matching #if")?;
        if frame.saw_else {
            return Err("multiple #else clauses for the same #if");
        }
        frame.saw_else = true;
        if frame.any_branch_taken {
            frame.branch_active = false;
        } else {
            frame.branch_active = frame.parent_active;
            frame.any_branch_taken = frame.branch_active;
        }
        Ok(())
    }

    pub fn endif(&mut self) -> Result<(), &'static str> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or("#endif with no matching #if")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_if_else() {
        let mut stack = ConditionalStack::new();
        stack.push_if(false);
        assert!(!stack.is_active());
        stack.else_branch().unwrap();
        assert!(stack.is_active());
        stack.endif().unwrap();
        assert!(stack.is_active());
    }

    #[test]
    fn elif_chain_picks_first_true_branch() {
        let mut stack = ConditionalStack::new();
        stack.push_if(false);
        stack.elif(false).unwrap();
        assert!(!stack.is_active());
        stack.elif(true).unwrap();
        assert!(stack.is_active());
        stack.elif(true).unwrap();
        assert!(!stack.is_active());
    }

    #[test]
    fn nested_if_inside_skipped_branch_stays_skipped() {
        let mut stack = ConditionalStack::new();
        stack.push_if(false);
        stack.push_if(true);
        assert!(!stack.is_active());
        stack.endif().unwrap();
        stack.endif().unwrap();
        assert!(stack.is_active());
    }
}
