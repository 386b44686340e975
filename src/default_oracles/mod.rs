pub mod first_fit_oracle;
