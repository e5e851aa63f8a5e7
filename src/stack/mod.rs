/// A singly linked LIFO stack. An empty stack is just `head == None`.
///
/// `push` consumes the stack and hands back the new top, so the usual
/// shape is `stack = stack.push(x)`.
pub struct Stack<T> {
    head: Option<Box<Frame<T>>>,
    len: usize,
}

struct Frame<T> {
    data: T,
    next: Option<Box<Frame<T>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("pop from an empty stack")]
    Empty,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Stack { head: None, len: 0 }
    }

    pub fn push(mut self, data: T) -> Self {
        let next = self.head.take();
        self.head = Some(Box::new(Frame { data, next }));
        self.len += 1;
        self
    }

    /// Remove the top frame and return its data.
    pub fn pop(&mut self) -> Result<T, StackError> {
        let frame = self.head.take().ok_or(StackError::Empty)?;
        let Frame { data, next } = *frame;
        self.head = next;
        self.len -= 1;
        Ok(data)
    }

    pub fn top(&self) -> Option<&T> {
        self.head.as_deref().map(|f| &f.data)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterate from the top frame down.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { next: self.head.as_deref() }
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Stack::new()
    }
}

// Unlink frames one at a time; the default recursive drop would blow the
// native stack on very deep root stacks.
impl<T> Drop for Stack<T> {
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(mut frame) = cur {
            cur = frame.next.take();
        }
    }
}

pub struct Iter<'a, T> {
    next: Option<&'a Frame<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let frame = self.next?;
        self.next = frame.next.as_deref();
        Some(&frame.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_is_lifo() {
        let mut s = Stack::new().push(1).push(2).push(3);
        assert_eq!(s.len(), 3);
        assert_eq!(s.top(), Some(&3));
        assert_eq!(s.pop(), Ok(3));
        assert_eq!(s.pop(), Ok(2));
        assert_eq!(s.pop(), Ok(1));
        assert!(s.is_empty());
    }

    #[test]
    fn pop_empty_is_an_error() {
        let mut s: Stack<u8> = Stack::default();
        assert_eq!(s.pop(), Err(StackError::Empty));
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn iter_walks_top_down() {
        let s = Stack::new().push("a").push("b").push("c");
        let seen: Vec<_> = s.iter().copied().collect();
        assert_eq!(seen, vec!["c", "b", "a"]);
    }

    #[test]
    fn deep_stack_drops_without_overflow() {
        let mut s = Stack::new();
        for i in 0..200_000u32 {
            s = s.push(i);
        }
        assert_eq!(s.len(), 200_000);
        drop(s);
    }
}
