mod core;

pub use core::{NewExpense, create_expense, create_expense_table, get_all_expenses};
