mod test_bezier_basic;
mod test_bvh_basic;
mod test_map4d_basic;
mod test_matrix4d_basic;
mod test_polyface_basic;
