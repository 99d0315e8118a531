use std::fmt::Display;

macro_rules! sizes {
    ($($nam:ident),+ $(,)?) => {[$((stringify!($nam), ::std::mem::size_of::<$nam>())),+]};
}

fn maxlen<T>(a: &[(&str, T)]) -> usize { a.iter().map(|&(nm, _)| nm.len()).max().unwrap_or(0) }

pub fn print_sizes(sz: &[(&str, usize)]) {
    let width = maxlen(sz);
    sz.iter().for_each(|&(nm, sz)| println!("{nm:width$} : {sz:>3} bytes"));
}
pub fn print_values<T: Display>(vals: &[(&str, T)]) {
    let width = maxlen(vals);
    vals.iter().for_each(|(nm, v)| println!("{nm:width$} : {v}"));
}

pub trait ResultExt: Sized {
    type Ok;
    type Err: Display;
    fn get_err(&self) -> Option<&Self::Err>;
    fn into_ok(self) -> Option<Self::Ok>;

    fn report_error(self, msg: &str) -> Self {
        if let Some(e) = self.get_err() {
            println!("{msg}: {e}");
        }
        self
    }
    /// Reports the error and carries on without the value.
    fn or_report(self, msg: &str) -> Option<Self::Ok> { self.report_error(msg).into_ok() }
}
impl<T, E: Display> ResultExt for Result<T, E> {
    type Ok = T;
    type Err = E;
    fn get_err(&self) -> Option<&E> { self.as_ref().err() }
    fn into_ok(self) -> Option<T> { self.ok() }
}
