mod prop_filters;
mod prop_index;
mod prop_sort;
