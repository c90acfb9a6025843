mod helpers;
mod newsletters;
