use std::cell::RefCell;
use std::rc::Rc;

/// Zero-argument callback invoked after the watched value changes.
pub type Listener = Rc<dyn Fn()>;

/// Single-threaded observable value cell.
///
/// Always holds a value, so `get` cannot fail. `set` notifies listeners
/// synchronously, in subscription order, and only when the new value differs
/// from the stored one. The value borrow is released before listeners run,
/// so a listener may call `get` or `set` on the same cell.
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<Listener>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Stores `value` and notifies listeners if it differs from the current
    /// value. Returns whether a change occurred.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.subscribe_rc(Rc::new(listener));
    }

    /// Registers a shared listener; lets one callback watch several cells.
    pub fn subscribe_rc(&self, listener: Listener) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_notifies_in_subscription_order() {
        let cell = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            cell.subscribe(move || order.borrow_mut().push(tag));
        }

        assert!(cell.set(7));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn equal_value_is_a_no_op() {
        let cell = Observable::new(42);
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        cell.subscribe(move || counter.set(counter.get() + 1));

        assert!(!cell.set(42));
        assert_eq!(fired.get(), 0);

        assert!(cell.set(43));
        assert!(!cell.set(43));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn listener_may_read_the_cell() {
        let cell = Observable::new(String::from("start"));
        let seen = Rc::new(RefCell::new(String::new()));
        let watched = cell.clone();
        let sink = Rc::clone(&seen);
        cell.subscribe(move || *sink.borrow_mut() = watched.get());

        cell.set(String::from("changed"));
        assert_eq!(*seen.borrow(), "changed");
    }

    #[test]
    fn get_returns_last_stored_value() {
        let cell = Observable::new(1);
        cell.set(2);
        cell.set(3);
        assert_eq!(cell.get(), 3);
    }
}
