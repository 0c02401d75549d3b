mod cli_test;
mod strategies_test;
